// src/summarize/mod.rs
//! Deep-summary collaborator: provider trait, a disabled provider and the
//! batch driver that degrades failed calls to fallback text.

pub mod openai;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::ingest::types::RawItem;

pub use openai::OpenAiSummarizer;

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("summarizer disabled (no api key)")]
    Disabled,
    #[error("http error: {0}")]
    Http(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("empty completion")]
    EmptyResponse,
    #[error("item has neither title nor content")]
    NoInput,
}

impl From<reqwest::Error> for SummarizeError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(s) => SummarizeError::Status(s.as_u16()),
            None => SummarizeError::Http(e.to_string()),
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Enriched text for one item. Never called for items without text.
    async fn summarize(&self, item: &RawItem) -> Result<String, SummarizeError>;
    fn name(&self) -> &'static str;
}

/// Used when no API key is configured; every item takes the fallback path.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _item: &RawItem) -> Result<String, SummarizeError> {
        Err(SummarizeError::Disabled)
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub item: RawItem,
    pub text: String,
    /// True when `text` is the truncated-content placeholder.
    pub fallback: bool,
}

/// Content (or title when content is empty) cut to `max_chars`, plus a tag hint.
pub fn fallback_text(item: &RawItem, max_chars: usize) -> String {
    let base = if item.content.trim().is_empty() {
        item.title.as_str()
    } else {
        item.content.as_str()
    };
    let mut out: String = base.chars().take(max_chars).collect();
    if !item.tags.is_empty() {
        out.push_str(&format!(" [标签: {}]", item.tags.join(", ")));
    }
    out
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "summarize_fallback_total",
            "Summaries replaced by truncated-content fallback."
        );
    });
}

/// Summarize `items` with at most `concurrency` calls in flight. Output order
/// matches input order; each failure degrades to [`fallback_text`].
pub async fn summarize_batch(
    summarizer: &dyn Summarizer,
    items: Vec<RawItem>,
    concurrency: usize,
    fallback_chars: usize,
) -> Vec<Summary> {
    ensure_metrics_described();

    stream::iter(items)
        .map(|item| async move {
            let res = if item.has_text() {
                summarizer.summarize(&item).await
            } else {
                Err(SummarizeError::NoInput)
            };
            match res {
                Ok(text) if !text.trim().is_empty() => Summary {
                    item,
                    text: text.trim().to_string(),
                    fallback: false,
                },
                other => {
                    if let Err(e) = other {
                        if !matches!(e, SummarizeError::Disabled) {
                            tracing::warn!(
                                summarizer = summarizer.name(),
                                title = %item.title,
                                error = %e,
                                "summary failed, using fallback"
                            );
                        }
                    }
                    counter!("summarize_fallback_total").increment(1);
                    Summary {
                        text: fallback_text(&item, fallback_chars),
                        item,
                        fallback: true,
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
