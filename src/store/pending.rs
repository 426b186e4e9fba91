// src/store/pending.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{load_or_default, now_unix, save_json_atomic, SECS_PER_DAY};
use crate::ingest::dedup::DedupKey;
use crate::ingest::types::RawItem;

/// A queued item plus the moment it entered the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingEntry {
    #[serde(flatten)]
    pub item: RawItem,
    pub queued_at: i64,
}

/// Persistent FIFO of items waiting for deep analysis.
///
/// Every mutating call purges entries older than the retention window first,
/// and `add_many` refuses items whose Dedup Key is already queued. Save
/// failures are logged and the in-memory state is kept.
#[derive(Debug)]
pub struct PendingQueue {
    path: PathBuf,
    retention_secs: i64,
    entries: Vec<PendingEntry>,
}

impl PendingQueue {
    pub const DEFAULT_RETENTION_DAYS: u32 = 2;

    pub fn open(path: impl Into<PathBuf>, retention_days: u32) -> Self {
        let path = path.into();
        let entries: Vec<PendingEntry> = load_or_default(&path, "pending");
        tracing::debug!(entries = entries.len(), "pending queue loaded");
        Self {
            path,
            retention_secs: i64::from(retention_days) * SECS_PER_DAY,
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    /// Append items not already queued (by Dedup Key). Returns how many were added.
    pub fn add_many(&mut self, items: Vec<RawItem>) -> usize {
        self.add_many_at(items, now_unix())
    }

    pub fn add_many_at(&mut self, items: Vec<RawItem>, now: i64) -> usize {
        self.purge(now);
        let mut existing: HashSet<DedupKey> =
            self.entries.iter().map(|e| DedupKey::of(&e.item)).collect();

        let mut added = 0usize;
        for item in items {
            if !existing.insert(DedupKey::of(&item)) {
                continue;
            }
            self.entries.push(PendingEntry {
                item,
                queued_at: now,
            });
            added += 1;
        }

        if added > 0 {
            self.persist();
        }
        metrics::gauge!("pending_queue_len").set(self.entries.len() as f64);
        added
    }

    /// Remove and return up to `limit` oldest items; the rest stay queued.
    pub fn pop_many(&mut self, limit: usize) -> Vec<RawItem> {
        self.pop_many_at(limit, now_unix())
    }

    pub fn pop_many_at(&mut self, limit: usize, now: i64) -> Vec<RawItem> {
        self.purge(now);
        if limit == 0 {
            return Vec::new();
        }
        let take = limit.min(self.entries.len());
        let popped: Vec<RawItem> = self.entries.drain(..take).map(|e| e.item).collect();
        self.persist();
        metrics::gauge!("pending_queue_len").set(self.entries.len() as f64);
        popped
    }

    /// Drain everything and persist the empty queue.
    pub fn pop_all(&mut self) -> Vec<RawItem> {
        self.pop_all_at(now_unix())
    }

    pub fn pop_all_at(&mut self, now: i64) -> Vec<RawItem> {
        self.purge(now);
        let popped: Vec<RawItem> = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|e| e.item)
            .collect();
        self.persist();
        metrics::gauge!("pending_queue_len").set(0.0);
        popped
    }

    fn purge(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        let ttl = self.retention_secs;
        self.entries
            .retain(|e| now.saturating_sub(e.queued_at) <= ttl);
        let purged = before - self.entries.len();
        if purged > 0 {
            tracing::debug!(purged, "expired pending entries dropped");
        }
        purged
    }

    fn persist(&self) {
        if let Err(e) = save_json_atomic(&self.path, &self.entries) {
            tracing::warn!(error = %e, "pending queue save failed; keeping in-memory state");
        }
    }
}
