//! Aggregates over the completed-session history, shown on the stats screen.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::SessionRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total_sessions: usize,
    pub total_seconds: u64,
    pub longest_session_seconds: u32,
    pub sessions_today: usize,
    /// Consecutive days with at least one completed session, ending today, or
    /// yesterday when nothing has been completed yet today.
    pub current_streak_days: u32,
    pub last_session_at: Option<DateTime<Utc>>,
}

impl HistoryStats {
    /// Only records flagged `completed` count. Days are UTC calendar days.
    pub fn from_history(history: &[SessionRecord], today: NaiveDate) -> Self {
        let completed: Vec<&SessionRecord> = history.iter().filter(|r| r.completed).collect();

        let days: BTreeSet<NaiveDate> = completed
            .iter()
            .map(|record| record.started_at.date_naive())
            .collect();

        Self {
            total_sessions: completed.len(),
            total_seconds: completed
                .iter()
                .map(|record| u64::from(record.duration_seconds))
                .sum(),
            longest_session_seconds: completed
                .iter()
                .map(|record| record.duration_seconds)
                .max()
                .unwrap_or(0),
            sessions_today: completed
                .iter()
                .filter(|record| record.started_at.date_naive() == today)
                .count(),
            current_streak_days: streak_ending_at(&days, today),
            last_session_at: completed.iter().map(|record| record.started_at).max(),
        }
    }

    pub fn total_minutes(&self) -> u64 {
        self.total_seconds / 60
    }
}

fn streak_ending_at(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}
