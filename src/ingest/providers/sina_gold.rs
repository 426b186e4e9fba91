// src/ingest/providers/sina_gold.rs
use async_trait::async_trait;

use crate::ingest::types::{Collector, CollectorError, RawItem};

const HQ_URL: &str = "https://hq.sinajs.cn/?list=hf_XAU,AU9999";
const HQ_REFERER: &str = "https://finance.sina.com.cn/";

/// One `var hq_str_X="..."` line. Fields: name, last, open, prev close,
/// high, low, then date and time somewhere after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinaQuote {
    pub symbol: String,
    pub name: String,
    pub last: String,
    pub open: String,
    pub prev_close: String,
    pub high: String,
    pub low: String,
    pub date: String,
    pub time: String,
}

pub fn parse_line(line: &str) -> Option<SinaQuote> {
    let rest = line.trim().strip_prefix("var hq_str_")?;
    let (symbol, rest) = rest.split_once('=')?;
    let payload = rest.trim().trim_end_matches(';').trim_matches('"');
    let parts: Vec<&str> = payload.split(',').map(str::trim).collect();
    if parts.len() < 6 {
        return None;
    }
    let last = parts[1];
    if last.is_empty() || last == "0" || last == "0.00" {
        return None;
    }
    // date/time are the last two date-like fields when present
    let date = parts
        .iter()
        .rev()
        .find(|p| p.len() == 10 && p.as_bytes().get(4) == Some(&b'-'))
        .copied()
        .unwrap_or_default();
    let time = parts
        .iter()
        .rev()
        .find(|p| p.len() == 8 && p.as_bytes().get(2) == Some(&b':'))
        .copied()
        .unwrap_or_default();

    Some(SinaQuote {
        symbol: symbol.trim().to_string(),
        name: if parts[0].is_empty() {
            symbol.trim().to_string()
        } else {
            parts[0].to_string()
        },
        last: last.to_string(),
        open: parts[2].to_string(),
        prev_close: parts[3].to_string(),
        high: parts[4].to_string(),
        low: parts[5].to_string(),
        date: date.to_string(),
        time: time.to_string(),
    })
}

/// Parse a whole `hq.sinajs.cn` response into quote items. Malformed or
/// empty lines are skipped.
pub fn parse_sina_hq(body: &str) -> Vec<RawItem> {
    body.lines()
        .filter_map(parse_line)
        .map(|q| {
            let title = format!(
                "黄金 | {} 现价:{} 开盘:{} 高:{} 低:{}",
                q.name, q.last, q.open, q.high, q.low
            );
            let content = format!("昨收:{} 时间:{} {}", q.prev_close, q.date, q.time)
                .trim()
                .to_string();
            RawItem::new(SinaGoldCollector::NAME, title, content, "")
        })
        .collect()
}

enum Mode {
    Fixture(String),
    Http(reqwest::Client),
}

pub struct SinaGoldCollector {
    mode: Mode,
}

impl SinaGoldCollector {
    pub const NAME: &'static str = "gold-sina";

    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http(client),
        }
    }

    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }
}

#[async_trait]
impl Collector for SinaGoldCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Http(client) => client
                .get(HQ_URL)
                .header(reqwest::header::REFERER, HQ_REFERER)
                .send()
                .await?
                .error_for_status()?
                .text_with_charset("gbk")
                .await?,
        };
        Ok(parse_sina_hq(&body))
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
