// src/scheduler/format.rs
//! Message layouts for the three delivery paths.

use super::buckets::Bucket;
use crate::ingest::types::RawItem;
use crate::notify::Message;
use crate::summarize::Summary;

pub const FALLBACK_MARK: &str = "（摘要降级）";

pub fn flagship_message(item: &RawItem) -> Message {
    Message::new(item.title.clone(), item.content.clone()).with_url(item.url.clone())
}

/// Title and link only, numbered.
pub fn immediate_message(bucket: Bucket, items: &[RawItem]) -> Message {
    let body = items
        .iter()
        .enumerate()
        .map(|(i, it)| {
            if it.url.is_empty() {
                format!("{}. {}", i + 1, it.title)
            } else {
                format!("{}. {}\n   {}", i + 1, it.title, it.url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    Message::new(
        format!("【{}】速览 {} 条", bucket.label(), items.len()),
        body,
    )
}

pub fn analysis_message(bucket: Bucket, summaries: &[&Summary]) -> Message {
    let body = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mark = if s.fallback { FALLBACK_MARK } else { "" };
            let mut block = format!("{}. {}\n{mark}{}", i + 1, s.item.title, s.text);
            if !s.item.url.is_empty() {
                block.push('\n');
                block.push_str(&s.item.url);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    Message::new(
        format!("【{}】深度解读 {} 条", bucket.label(), summaries.len()),
        body,
    )
}
