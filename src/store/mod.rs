// src/store/mod.rs
//! Local JSON snapshots backing the seen-ledger and the pending queue.
//!
//! Loading and saving return explicit [`StoreError`]s. The stores themselves
//! decide what to do with them, and both choose fail-open: a missing or corrupt
//! file becomes empty state and a failed save keeps the in-memory state.

pub mod ledger;
pub mod pending;

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use ledger::SeenLedger;
pub use pending::{PendingEntry, PendingQueue};

pub const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {0} does not exist")]
    Missing(PathBuf),

    #[error("i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and decode a JSON snapshot.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::Missing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `<path>.tmp` then rename it over `path`. Creates the parent directory.
pub fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut f = fs::File::create(&tmp).map_err(io_err)?;
    f.write_all(&json).map_err(io_err)?;
    f.sync_all().map_err(io_err)?;
    drop(f);
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Load a snapshot, degrading to `T::default()` on any error.
pub(crate) fn load_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    match load_json(path) {
        Ok(v) => v,
        Err(StoreError::Missing(_)) => {
            tracing::debug!(store = what, path = %path.display(), "no state file yet, starting empty");
            T::default()
        }
        Err(e) => {
            tracing::warn!(store = what, error = %e, "state unreadable, starting empty");
            T::default()
        }
    }
}

/// Current UNIX time in seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
