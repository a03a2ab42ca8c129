use anyhow::Result;
use std::path::PathBuf;

use super::{SessionStore, StoreError};
use crate::db::Database;
use crate::models::SessionRecord;

/// History kept in the `sessions` table of a local SQLite database.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        Ok(Self {
            db: Database::new(path)?,
        })
    }

    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    fn location(&self) -> String {
        self.db.path().display().to_string()
    }
}

impl SessionStore for SqliteStore {
    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError> {
        self.db
            .list_sessions()
            .map_err(|err| StoreError::read(self.location(), err))
    }

    fn save_all(&self, records: &[SessionRecord]) -> Result<(), StoreError> {
        self.db
            .replace_sessions(records)
            .map_err(|err| StoreError::write(self.location(), err))
    }
}
