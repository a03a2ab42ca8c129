//! Persistence surface for session history.
//!
//! The timer treats every store as best-effort: a failed load starts with an
//! empty history and a failed save keeps the in-memory history authoritative.

mod json;
mod memory;
mod sqlite;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::SessionRecord;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read session history from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to write session history to {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    pub fn read(location: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        StoreError::Read {
            location: location.into(),
            source: source.into(),
        }
    }

    pub fn write(location: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        StoreError::Write {
            location: location.into(),
            source: source.into(),
        }
    }
}

/// Whole-history persistence. `save_all` always receives the complete ordered
/// history, and a following `load_all` must return it unchanged.
pub trait SessionStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError>;

    fn save_all(&self, records: &[SessionRecord]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    Json,
    Sqlite,
}

impl StoreBackend {
    pub fn file_name(&self) -> &'static str {
        match self {
            StoreBackend::Json => "sessions.json",
            StoreBackend::Sqlite => "stillpoint.sqlite3",
        }
    }
}

/// Opens the store for `backend` inside `data_dir`.
pub fn open_store(backend: StoreBackend, data_dir: PathBuf) -> anyhow::Result<Box<dyn SessionStore>> {
    let path = data_dir.join(backend.file_name());
    let store: Box<dyn SessionStore> = match backend {
        StoreBackend::Json => Box::new(JsonFileStore::new(path)),
        StoreBackend::Sqlite => Box::new(SqliteStore::open(path)?),
    };
    Ok(store)
}
