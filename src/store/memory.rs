use std::sync::RwLock;

use super::{SessionStore, StoreError};
use crate::models::SessionRecord;

/// Process-local history; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SessionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let guard = match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(guard.clone())
    }

    fn save_all(&self, records: &[SessionRecord]) -> Result<(), StoreError> {
        let mut guard = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{assert_round_trip, sample_history};

    #[test]
    fn test_round_trip() {
        assert_round_trip(&MemoryStore::new());
    }

    #[test]
    fn test_with_records_seeds_history() {
        let history = sample_history();
        let store = MemoryStore::with_records(history.clone());
        assert_eq!(store.load_all().unwrap(), history);
    }
}
