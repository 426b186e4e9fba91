// src/ingest/dedup.rs
//! Dedup Key derivation.
//!
//! Preference order: non-empty `url` → non-empty `title` → SHA-256 fingerprint
//! of title + content. Two items with the same key are the same news event.

use sha2::{Digest, Sha256};
use std::fmt;

use super::types::RawItem;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn of(item: &RawItem) -> Self {
        let url = item.url.trim();
        if !url.is_empty() {
            return Self(format!("url:{url}"));
        }
        let title = item.title.trim();
        if !title.is_empty() {
            return Self(format!("title:{title}"));
        }
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\n");
        hasher.update(item.content.trim().as_bytes());
        Self(format!("raw:{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DedupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
