use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::models::{is_allowed_duration, SessionRecord, DEFAULT_DURATION_MINUTES};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    /// Transient: the completion transition passes through it and settles on
    /// `Idle` before the state lock is released.
    Completed,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} while the timer is {status:?}")]
pub struct TransitionError {
    pub action: &'static str,
    pub status: TimerStatus,
}

/// Result of feeding one scheduler tick into the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Timer was not running; nothing changed.
    Ignored,
    Running { remaining: Duration },
    Completed(SessionRecord),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    status: TimerStatus,
    selected_duration_minutes: u32,
    started_at: Option<DateTime<Utc>>,
    /// Planned length captured by `start`; what the completion record carries.
    session_duration_seconds: u32,
    #[serde(skip)]
    remaining: Duration,
    /// Remaining time at the moment `running_anchor` was taken. Paused spans
    /// are excluded because pausing folds elapsed time in and drops the anchor.
    #[serde(skip)]
    remaining_baseline: Duration,
    #[serde(skip)]
    running_anchor: Option<Instant>,
    #[serde(skip)]
    history: Vec<SessionRecord>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MINUTES, Vec::new())
    }
}

impl TimerState {
    pub fn new(selected_duration_minutes: u32, history: Vec<SessionRecord>) -> Self {
        let minutes = if is_allowed_duration(selected_duration_minutes) {
            selected_duration_minutes
        } else {
            DEFAULT_DURATION_MINUTES
        };
        let full = full_duration(minutes);

        Self {
            status: TimerStatus::Idle,
            selected_duration_minutes: minutes,
            started_at: None,
            session_duration_seconds: minutes * 60,
            remaining: full,
            remaining_baseline: full,
            running_anchor: None,
            history,
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn selected_duration_minutes(&self) -> u32 {
        self.selected_duration_minutes
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn history(&self) -> &[SessionRecord] {
        &self.history
    }

    /// Remaining time as of the last transition or tick.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn remaining_seconds(&self) -> f64 {
        self.remaining.as_secs_f64()
    }

    /// Remaining time evaluated against `now` without mutating anything.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match (self.status, self.running_anchor) {
            (TimerStatus::Running, Some(anchor)) => self
                .remaining_baseline
                .saturating_sub(now.saturating_duration_since(anchor)),
            _ => self.remaining,
        }
    }

    pub fn start(&mut self, now: Instant) -> Result<(), TransitionError> {
        if self.status != TimerStatus::Idle {
            return Err(self.refuse("start"));
        }

        let full = full_duration(self.selected_duration_minutes);
        self.status = TimerStatus::Running;
        self.started_at = Some(Utc::now());
        self.session_duration_seconds = self.selected_duration_minutes * 60;
        self.remaining = full;
        self.remaining_baseline = full;
        self.running_anchor = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: Instant) -> Result<(), TransitionError> {
        if self.status != TimerStatus::Running {
            return Err(self.refuse("pause"));
        }

        self.remaining = self.remaining_at(now);
        self.remaining_baseline = self.remaining;
        self.running_anchor = None;
        self.status = TimerStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: Instant) -> Result<(), TransitionError> {
        if self.status != TimerStatus::Paused {
            return Err(self.refuse("resume"));
        }

        self.remaining_baseline = self.remaining;
        self.running_anchor = Some(now);
        self.status = TimerStatus::Running;
        Ok(())
    }

    /// Abandons the active session without recording it. Returns `false` when
    /// there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        match self.status {
            TimerStatus::Running | TimerStatus::Paused => {
                self.reset_to_idle();
                true
            }
            TimerStatus::Idle | TimerStatus::Completed => false,
        }
    }

    /// Changes the selected length. Refused (returns `false`) for values
    /// outside the allowed set. An active countdown keeps its remaining time.
    pub fn update_duration(&mut self, minutes: u32) -> bool {
        if !is_allowed_duration(minutes) {
            return false;
        }

        self.selected_duration_minutes = minutes;
        if self.status == TimerStatus::Idle {
            let full = full_duration(minutes);
            self.remaining = full;
            self.remaining_baseline = full;
        }
        true
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }

        self.remaining = self.remaining_at(now);
        if self.remaining.is_zero() {
            TickOutcome::Completed(self.complete())
        } else {
            TickOutcome::Running {
                remaining: self.remaining,
            }
        }
    }

    fn complete(&mut self) -> SessionRecord {
        self.status = TimerStatus::Completed;
        self.remaining = Duration::ZERO;

        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let record = SessionRecord::completed(started_at, self.session_duration_seconds);
        self.history.push(record.clone());

        self.reset_to_idle();
        record
    }

    fn reset_to_idle(&mut self) {
        let full = full_duration(self.selected_duration_minutes);
        self.status = TimerStatus::Idle;
        self.started_at = None;
        self.remaining = full;
        self.remaining_baseline = full;
        self.running_anchor = None;
    }

    fn refuse(&self, action: &'static str) -> TransitionError {
        TransitionError {
            action,
            status: self.status,
        }
    }
}

fn full_duration(minutes: u32) -> Duration {
    Duration::from_secs(u64::from(minutes) * 60)
}
