// src/ingest/providers/eastmoney.rs
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::classify::SECTOR_TERMS;
use crate::ingest::normalize_text;
use crate::ingest::types::{Collector, CollectorError, RawItem};

const FLASH_URL: &str =
    "https://np-weblist.eastmoney.com/comm/web/getFastNewsList?client=web&biz=web_724";
const FLASH_REFERER: &str = "https://kuaixun.eastmoney.com/";
const GOLD_URL: &str = "https://push2.eastmoney.com/api/qt/ulist/get?fltt=2&invt=2&dect=2&np=1&fields=f2,f3,f4,f12,f13,f14,f15,f16,f17,f18&secids=100.GC00,103.GC00,113.GC00,123.GC00,131.YAUUSD";

enum Mode {
    Fixture(String),
    Http(reqwest::Client),
}

// ---------------------------------------------------------------
// 7x24 fast news
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FlashResp {
    #[serde(default)]
    data: Option<FlashData>,
}

#[derive(Debug, Deserialize)]
struct FlashData {
    #[serde(rename = "fastNewsList", default)]
    fast_news_list: Vec<FlashEntry>,
    // older field name
    #[serde(default)]
    list: Vec<FlashEntry>,
}

#[derive(Debug, Deserialize)]
struct FlashEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

pub fn parse_flash_json(source: &str, body: &str) -> Result<Vec<RawItem>, CollectorError> {
    let resp: FlashResp =
        serde_json::from_str(body).map_err(|e| CollectorError::Parse(e.to_string()))?;
    let Some(data) = resp.data else {
        return Ok(Vec::new());
    };
    let entries = if data.fast_news_list.is_empty() {
        data.list
    } else {
        data.fast_news_list
    };
    Ok(entries
        .into_iter()
        .map(|e| {
            RawItem::new(
                source,
                normalize_text(&e.title),
                normalize_text(&e.summary),
                e.url.trim(),
            )
        })
        .filter(RawItem::has_text)
        .collect())
}

/// One column of the fast-news list. Column 102 is the general 7x24 feed,
/// column 103 the fund desk.
pub struct EastmoneyFlashCollector {
    name: String,
    column: u32,
    page_size: u32,
    mode: Mode,
}

impl EastmoneyFlashCollector {
    pub const NAME: &'static str = "eastmoney-flash";
    pub const FUND_NAME: &'static str = "eastmoney-fund";

    pub fn from_client(client: reqwest::Client) -> Self {
        Self::column(Self::NAME, client, 102, 20)
    }

    pub fn fund(client: reqwest::Client) -> Self {
        Self::column(Self::FUND_NAME, client, 103, 50)
    }

    pub fn column(
        name: impl Into<String>,
        client: reqwest::Client,
        column: u32,
        page_size: u32,
    ) -> Self {
        Self {
            name: name.into(),
            column,
            page_size,
            mode: Mode::Http(client),
        }
    }

    pub fn from_fixture(body: &str) -> Self {
        Self {
            name: Self::NAME.to_string(),
            column: 102,
            page_size: 20,
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn url(&self, trace: i64) -> String {
        format!(
            "{FLASH_URL}&fastColumn={}&pageSize={}&sortEnd=&req_trace={trace}",
            self.column, self.page_size
        )
    }
}

#[async_trait]
impl Collector for EastmoneyFlashCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        match &self.mode {
            Mode::Fixture(s) => parse_flash_json(&self.name, s),
            Mode::Http(client) => {
                let url = self.url(chrono::Utc::now().timestamp_millis());
                let body = client
                    .get(url)
                    .header(reqwest::header::REFERER, FLASH_REFERER)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                parse_flash_json(&self.name, &body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------
// Precious-metal quotes
// ---------------------------------------------------------------

fn field(v: &Value, key: &str) -> String {
    match v.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn has_price(v: &str) -> bool {
    !v.is_empty() && v != "-"
}

/// `data.diff` is sometimes an array and sometimes an object keyed by index.
fn diff_rows(body: &str) -> Result<Vec<Value>, CollectorError> {
    let mut root: Value =
        serde_json::from_str(body).map_err(|e| CollectorError::Parse(e.to_string()))?;
    Ok(match root.pointer_mut("/data/diff").map(Value::take) {
        Some(Value::Array(a)) => a,
        Some(Value::Object(m)) => m.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    })
}

/// Quotes with a `-` or missing price are skipped.
pub fn parse_gold_quotes_json(body: &str) -> Result<Vec<RawItem>, CollectorError> {
    let rows = diff_rows(body)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        let price = field(row, "f2");
        if !has_price(&price) {
            continue;
        }
        let mut name = field(row, "f14");
        if name.is_empty() {
            name = "黄金".to_string();
        }
        let title = format!("黄金 | {name} 现价:{price} 涨幅:{}%", field(row, "f3"));
        let content = format!(
            "开盘:{} 高:{} 低:{} 昨收:{}",
            field(row, "f17"),
            field(row, "f15"),
            field(row, "f16"),
            field(row, "f18"),
        );
        // No url: the key falls back to the title, which carries the price.
        out.push(RawItem::new(EastmoneyGoldCollector::NAME, title, content, ""));
    }
    Ok(out)
}

pub struct EastmoneyGoldCollector {
    mode: Mode,
}

impl EastmoneyGoldCollector {
    pub const NAME: &'static str = "gold-eastmoney";

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
impl Collector for EastmoneyGoldCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        match &self.mode {
            Mode::Fixture(s) => parse_gold_quotes_json(s),
            Mode::Http(client) => {
                let body = client
                    .get(GOLD_URL)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                parse_gold_quotes_json(&body)
            }
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ---------------------------------------------------------------
// Sector board snapshot
// ---------------------------------------------------------------

const BOARD_URL: &str = "https://push2.eastmoney.com/api/qt/clist/get?pn=1&pz=200&po=1&np=1&fltt=2&fid=f3&fields=f2,f3,f4,f12,f14,f15,f16,f17,f18&fs=";
const BOARD_PAGE: &str = "https://quote.eastmoney.com/bk/90.";

/// Industry boards, then concept boards.
pub const BOARD_LISTS: &[&str] = &["m:90+t:2", "m:90+t:3"];

/// Boards whose name contains one of `terms`. The url is the board page, so a
/// board reports once per ledger retention window.
pub fn parse_sector_boards_json(
    body: &str,
    terms: &[&str],
) -> Result<Vec<RawItem>, CollectorError> {
    let rows = diff_rows(body)?;

    let mut out = Vec::new();
    for row in &rows {
        let name = field(row, "f14");
        if name.is_empty() || !terms.iter().any(|t| name.contains(t)) {
            continue;
        }
        let last = field(row, "f2");
        if !has_price(&last) {
            continue;
        }
        let code = field(row, "f12");
        let title = format!(
            "板块开盘 | {name} 开盘:{} 现价:{last} 涨跌:{} 涨幅:{}%",
            field(row, "f17"),
            field(row, "f4"),
            field(row, "f3"),
        );
        let content = format!(
            "高:{} 低:{} 昨收:{} 代码:{code}",
            field(row, "f15"),
            field(row, "f16"),
            field(row, "f18"),
        );
        let url = if code.is_empty() {
            String::new()
        } else {
            format!("{BOARD_PAGE}{code}.html")
        };
        out.push(RawItem::new(SectorBoardCollector::NAME, title, content, url));
    }
    Ok(out)
}

enum BoardMode {
    Fixture(Vec<String>),
    Http(reqwest::Client),
}

/// Board lists are fetched concurrently; one failing list is logged and the
/// other still reports.
pub struct SectorBoardCollector {
    terms: Vec<String>,
    request_timeout: Duration,
    mode: BoardMode,
}

impl SectorBoardCollector {
    pub const NAME: &'static str = "sector-boards";

    pub fn from_client(client: reqwest::Client) -> Self {
        Self::with_mode(BoardMode::Http(client))
    }

    /// One document per board list.
    pub fn from_fixtures<I, S>(docs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(BoardMode::Fixture(docs.into_iter().map(Into::into).collect()))
    }

    fn with_mode(mode: BoardMode) -> Self {
        Self {
            terms: SECTOR_TERMS.iter().map(|t| t.to_string()).collect(),
            request_timeout: Duration::from_secs(8),
            mode,
        }
    }

    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn parse(&self, body: &str) -> Result<Vec<RawItem>, CollectorError> {
        let terms: Vec<&str> = self.terms.iter().map(String::as_str).collect();
        parse_sector_boards_json(body, &terms)
    }

    async fn fetch_list(
        &self,
        client: &reqwest::Client,
        fs: &str,
    ) -> Result<Vec<RawItem>, CollectorError> {
        let req = async {
            let body = client
                .get(format!("{BOARD_URL}{fs}"))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            self.parse(&body)
        };
        match tokio::time::timeout(self.request_timeout, req).await {
            Ok(res) => res,
            Err(_) => Err(CollectorError::Timeout(self.request_timeout.as_secs())),
        }
    }
}

#[async_trait]
impl Collector for SectorBoardCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        let results: Vec<(String, Result<Vec<RawItem>, CollectorError>)> = match &self.mode {
            BoardMode::Fixture(docs) => docs
                .iter()
                .enumerate()
                .map(|(i, d)| (format!("fixture#{i}"), self.parse(d)))
                .collect(),
            BoardMode::Http(client) => {
                let fetches = BOARD_LISTS.iter().map(|fs| async move {
                    (fs.to_string(), self.fetch_list(client, fs).await)
                });
                join_all(fetches).await
            }
        };

        let total = results.len();
        let mut items = Vec::new();
        let mut failures = Vec::new();
        for (list, res) in results {
            match res {
                Ok(found) => items.extend(found),
                Err(e) => {
                    tracing::warn!(
                        collector = Self::NAME,
                        list = %list,
                        error = %e,
                        "board list skipped"
                    );
                    failures.push(format!("{list}: {e}"));
                }
            }
        }
        if total > 0 && failures.len() == total {
            return Err(CollectorError::Empty(failures.join("; ")));
        }
        Ok(items)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
