//! Record persistence: the in-memory index and its backing store.
//!
//! # Responsibility
//! - Own every live record, keyed by composite key.
//! - Flush the whole index to, and load it from, a single JSON file.
//!
//! # Invariants
//! - The index holds at most one record per composite key.
//! - A missing store file loads as an empty index; an unreadable one is an
//!   error, never an empty index.

use crate::model::record::{Record, RecordDecodeError};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod file_storage;

pub use file_storage::FileStorage;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    Corrupt(String),
    InvalidRecord {
        key: String,
        source: RecordDecodeError,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "store I/O failed at `{}`: {source}", path.display()),
            Self::Json(err) => write!(f, "store content is not valid JSON: {err}"),
            Self::Corrupt(message) => write!(f, "store content is corrupt: {message}"),
            Self::InvalidRecord { key, source } => write!(f, "stored record `{key}` is invalid: {source}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Corrupt(_) => None,
            Self::InvalidRecord { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Index-plus-backing-store contract used by the console.
pub trait RecordStore {
    /// Full composite-key index.
    fn all(&self) -> &HashMap<String, Record>;
    fn get_mut(&mut self, key: &str) -> Option<&mut Record>;
    /// Inserts or overwrites the record under its composite key.
    fn register(&mut self, record: Record);
    fn remove(&mut self, key: &str) -> Option<Record>;
    /// Writes the whole index to the backing store.
    fn flush(&self) -> StoreResult<()>;

    fn get(&self, key: &str) -> Option<&Record> {
        self.all().get(key)
    }

    /// Records ordered by `created_at`, then key, optionally filtered by kind.
    fn list(&self, kind: Option<&str>) -> Vec<&Record> {
        let mut records = self
            .all()
            .values()
            .filter(|record| kind.map_or(true, |kind| record.kind() == kind))
            .collect::<Vec<_>>();
        records.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.key().cmp(&right.key()))
        });
        records
    }

    fn count(&self, kind: &str) -> usize {
        self.all()
            .values()
            .filter(|record| record.kind() == kind)
            .count()
    }
}
