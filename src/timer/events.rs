use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use super::{TimerState, TimerStatus};
use crate::models::SessionRecord;

/// Point-in-time view of the timer handed to subscribers and callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub selected_duration_minutes: u32,
    pub remaining_seconds: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_sessions: usize,
}

impl TimerSnapshot {
    pub fn capture(state: &TimerState, now: Instant) -> Self {
        Self {
            status: state.status(),
            selected_duration_minutes: state.selected_duration_minutes(),
            remaining_seconds: state.remaining_at(now).as_secs_f64(),
            started_at: state.started_at(),
            completed_sessions: state.history().len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    StateChanged(TimerSnapshot),
    Heartbeat(TimerSnapshot),
    #[serde(rename_all = "camelCase")]
    SessionCompleted { record: SessionRecord },
    /// History could not be written after a completion. The in-memory history
    /// still holds the record.
    #[serde(rename_all = "camelCase")]
    PersistenceFailed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_state() {
        let state = TimerState::new(15, Vec::new());
        let snapshot = TimerSnapshot::capture(&state, Instant::now());

        assert_eq!(snapshot.status, TimerStatus::Idle);
        assert_eq!(snapshot.selected_duration_minutes, 15);
        assert_eq!(snapshot.remaining_seconds, 900.0);
        assert_eq!(snapshot.completed_sessions, 0);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let state = TimerState::default();
        let event = TimerEvent::StateChanged(TimerSnapshot::capture(&state, Instant::now()));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "stateChanged");
        assert_eq!(json["status"], "idle");
        assert_eq!(json["remainingSeconds"], 600.0);

        let failed = TimerEvent::PersistenceFailed {
            message: "disk full".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["type"], "persistenceFailed");
        assert_eq!(json["message"], "disk full");
    }
}
