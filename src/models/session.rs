use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lengths the timer accepts, in minutes.
pub const ALLOWED_DURATIONS_MINUTES: [u32; 4] = [5, 10, 15, 20];

pub const DEFAULT_DURATION_MINUTES: u32 = 10;

pub fn is_allowed_duration(minutes: u32) -> bool {
    ALLOWED_DURATIONS_MINUTES.contains(&minutes)
}

/// One finished meditation session. Only sessions that counted down to zero
/// are ever recorded, so `completed` is true for everything the timer writes;
/// the flag is kept so stores written by other tools still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub completed: bool,
}

impl SessionRecord {
    pub fn completed(started_at: DateTime<Utc>, duration_seconds: u32) -> Self {
        debug_assert!(duration_seconds > 0, "session duration must be positive");
        Self {
            id: Uuid::new_v4(),
            started_at,
            duration_seconds,
            completed: true,
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_seconds / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_durations() {
        for minutes in ALLOWED_DURATIONS_MINUTES {
            assert!(is_allowed_duration(minutes));
        }
        assert!(is_allowed_duration(DEFAULT_DURATION_MINUTES));
        assert!(!is_allowed_duration(0));
        assert!(!is_allowed_duration(7));
        assert!(!is_allowed_duration(60));
    }

    #[test]
    fn test_completed_record() {
        let started_at = Utc::now();
        let record = SessionRecord::completed(started_at, 600);

        assert_eq!(record.started_at, started_at);
        assert_eq!(record.duration_seconds, 600);
        assert_eq!(record.duration_minutes(), 10);
        assert!(record.completed);
    }

    #[test]
    fn test_records_get_unique_ids() {
        let started_at = Utc::now();
        let a = SessionRecord::completed(started_at, 300);
        let b = SessionRecord::completed(started_at, 300);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_serializes_camel_case() {
        let record = SessionRecord::completed(Utc::now(), 900);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["durationSeconds"], 900);
        assert_eq!(json["completed"], true);
        assert!(json.get("startedAt").is_some());
    }
}
