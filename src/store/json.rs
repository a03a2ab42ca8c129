use anyhow::Context;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::{SessionStore, StoreError};
use crate::models::SessionRecord;

/// History kept as a pretty-printed JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

impl SessionStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::read(self.location(), err)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .context("history file is not a valid session list")
            .map_err(|err| StoreError::read(self.location(), err))
    }

    fn save_all(&self, records: &[SessionRecord]) -> Result<(), StoreError> {
        let write = || -> anyhow::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create history directory {}", parent.display())
                })?;
            }
            let serialized = serde_json::to_string_pretty(records)?;
            fs::write(&self.path, serialized)?;
            Ok(())
        };

        write().map_err(|err| StoreError::write(self.location(), err))
    }
}
