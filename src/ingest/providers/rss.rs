// src/ingest/providers/rss.rs
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::types::{Collector, CollectorError, RawItem};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

/// One parsed feed entry before it becomes a `RawItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Parse RSS 2.0, falling back to Atom. Entries without title or link are skipped;
/// an entry without description uses its title as content.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, CollectorError> {
    let xml = scrub_html_entities_for_xml(xml);

    if let Ok(rss) = from_str::<Rss>(&xml) {
        let out: Vec<FeedEntry> = rss
            .channel
            .item
            .into_iter()
            .filter_map(|it| {
                let title = normalize_text(it.title.as_deref().unwrap_or_default());
                let url = it.link.unwrap_or_default().trim().to_string();
                if title.is_empty() || url.is_empty() {
                    return None;
                }
                let content = it
                    .description
                    .map(|d| normalize_text(&d))
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| title.clone());
                Some(FeedEntry {
                    title,
                    url,
                    content,
                })
            })
            .collect();
        if !out.is_empty() {
            return Ok(out);
        }
    }

    let atom: Atom = from_str(&xml).map_err(|e| CollectorError::Parse(e.to_string()))?;
    Ok(atom
        .entry
        .into_iter()
        .filter_map(|e| {
            let title = normalize_text(&e.title.map(|t| t.value).unwrap_or_default());
            let href = e
                .link
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| e.link.first())
                .and_then(|l| l.href.clone())
                .unwrap_or_default();
            if title.is_empty() || href.trim().is_empty() {
                return None;
            }
            let content = e
                .summary
                .or(e.content)
                .map(|t| normalize_text(&t.value))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| title.clone());
            Some(FeedEntry {
                title,
                url: href.trim().to_string(),
                content,
            })
        })
        .collect())
}

/// Generic multi-feed collector. Feeds are fetched concurrently, each under its
/// own timeout. A feed failure is logged and skipped; the collector itself
/// fails only when every feed failed.
pub struct RssCollector {
    name: String,
    max_items: usize,
    feed_timeout: Duration,
    concurrency: usize,
    mode: Mode,
}

enum Mode {
    Fixture(Vec<String>),
    Http {
        client: reqwest::Client,
        feeds: Vec<String>,
    },
}

impl RssCollector {
    pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(8);
    pub const DEFAULT_CONCURRENCY: usize = 4;

    pub fn from_feeds(
        name: impl Into<String>,
        client: reqwest::Client,
        feeds: &[&str],
        max_items: usize,
    ) -> Self {
        Self {
            name: name.into(),
            max_items,
            feed_timeout: Self::DEFAULT_FEED_TIMEOUT,
            concurrency: Self::DEFAULT_CONCURRENCY,
            mode: Mode::Http {
                client,
                feeds: feeds.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    /// Serve pre-fetched documents instead of hitting the network.
    pub fn from_fixtures<I, S>(name: impl Into<String>, docs: I, max_items: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            max_items,
            feed_timeout: Self::DEFAULT_FEED_TIMEOUT,
            concurrency: Self::DEFAULT_CONCURRENCY,
            mode: Mode::Fixture(docs.into_iter().map(Into::into).collect()),
        }
    }

    /// Keep this below the orchestrator's collector timeout, otherwise one
    /// stalled feed costs the whole collector.
    pub fn with_feed_timeout(mut self, timeout: Duration) -> Self {
        self.feed_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    fn to_items(&self, entries: Vec<FeedEntry>) -> Vec<RawItem> {
        entries
            .into_iter()
            .take(self.max_items)
            .map(|e| RawItem::new(self.name.as_str(), e.title, e.content, e.url))
            .collect()
    }

    /// One `(label, result)` per feed, in feed order.
    async fn fetch_all(&self) -> Vec<(String, Result<Vec<FeedEntry>, CollectorError>)> {
        match &self.mode {
            Mode::Fixture(docs) => docs
                .iter()
                .enumerate()
                .map(|(i, doc)| (format!("fixture#{i}"), parse_feed(doc)))
                .collect(),
            Mode::Http { client, feeds } => {
                let per_feed = self.feed_timeout;
                stream::iter(feeds.iter().cloned())
                    .map(|url: String| async move {
                        let fetched = tokio::time::timeout(per_feed, fetch_text(client, &url)).await;
                        let res = match fetched {
                            Ok(body) => body.and_then(|b| parse_feed(&b)),
                            Err(_) => Err(CollectorError::Timeout(per_feed.as_secs())),
                        };
                        (url, res)
                    })
                    .buffered(self.concurrency)
                    .collect()
                    .await
            }
        }
    }
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, CollectorError> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}

#[async_trait]
impl Collector for RssCollector {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError> {
        let outcomes = self.fetch_all().await;
        let total = outcomes.len();

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for (feed, res) in outcomes {
            match res {
                Ok(entries) => items.extend(self.to_items(entries)),
                Err(e) => {
                    tracing::debug!(collector = %self.name, feed = %feed, error = %e, "feed skipped");
                    failures.push(format!("{feed}: {e}"));
                }
            }
        }

        if total > 0 && failures.len() == total {
            return Err(CollectorError::Empty(failures.join("; ")));
        }
        if !failures.is_empty() {
            tracing::warn!(
                collector = %self.name,
                failed_feeds = failures.len(),
                total_feeds = total,
                "some feeds failed"
            );
        }
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// quick-xml only knows the five XML entities; map the common HTML ones first.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\u{201C}")
        .replace("&rdquo;", "\u{201D}")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
