// src/store/ledger.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{load_or_default, now_unix, save_json_atomic, StoreError, SECS_PER_DAY};

/// Cross-run memory of Dedup Keys → last-seen UNIX seconds.
///
/// Loaded eagerly; entries beyond the retention window are purged at load time
/// and before every dedup pass, so a stale entry is never trusted by `seen`.
/// [`flush`](SeenLedger::flush) purges once more before writing.
#[derive(Debug)]
pub struct SeenLedger {
    path: PathBuf,
    retention_secs: i64,
    entries: HashMap<String, i64>,
}

impl SeenLedger {
    pub const DEFAULT_RETENTION_DAYS: u32 = 7;

    /// Open the ledger at `path`. Missing or corrupt files yield an empty ledger.
    pub fn open(path: impl Into<PathBuf>, retention_days: u32) -> Self {
        Self::open_at(path, retention_days, now_unix())
    }

    pub fn open_at(path: impl Into<PathBuf>, retention_days: u32, now: i64) -> Self {
        let path = path.into();
        let entries: HashMap<String, i64> = load_or_default(&path, "ledger");
        let mut ledger = Self {
            path,
            retention_secs: i64::from(retention_days) * SECS_PER_DAY,
            entries,
        };
        let purged = ledger.purge(now);
        tracing::debug!(
            entries = ledger.entries.len(),
            purged,
            "seen-ledger loaded"
        );
        ledger
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

    pub fn seen(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Record `key` as seen now. Re-marking refreshes the timestamp.
    pub fn mark(&mut self, key: &str) {
        self.mark_at(key, now_unix());
    }

    pub fn mark_at(&mut self, key: &str, now: i64) {
        self.entries.insert(key.to_string(), now);
    }

    /// Drop entries older than the retention window. Returns how many went.
    pub fn purge(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        let ttl = self.retention_secs;
        self.entries.retain(|_, ts| now.saturating_sub(*ts) <= ttl);
        before - self.entries.len()
    }

    /// Purge, then persist. Call once per orchestration run after all marks.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.flush_at(now_unix())
    }

    pub fn flush_at(&mut self, now: i64) -> Result<(), StoreError> {
        self.purge(now);
        save_json_atomic(&self.path, &self.entries)
    }
}
