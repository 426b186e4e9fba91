// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One candidate record produced by a collector.
///
/// `title` may be empty only when `content` is present. `tags` is filled either
/// by the collector itself or later by the classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: String, // collector name, diagnostics only
}

impl RawItem {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            url: url.into(),
            tags: Vec::new(),
            source: source.into(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Text the classifier looks at: title and content on separate lines.
    pub fn match_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }

    pub fn has_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.content.trim().is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("http error: {0}")]
    Http(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("no usable items from any upstream ({0})")]
    Empty(String),
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => CollectorError::Status(status.as_u16()),
            None => CollectorError::Http(err.to_string()),
        }
    }
}

/// A single upstream source. Implementations must be independent: a failure
/// here only removes this collector's contribution from the current run.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn crawl(&self) -> Result<Vec<RawItem>, CollectorError>;
    fn name(&self) -> &str;
}
