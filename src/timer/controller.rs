use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use tokio::{
    sync::{broadcast, Mutex},
    task::{self, JoinHandle},
    time::{self, Instant, MissedTickBehavior},
};

use super::{TickOutcome, TimerEvent, TimerSnapshot, TimerState, TimerStatus, TransitionError};
use crate::{
    log_debug, log_error, log_info, log_warn,
    models::SessionRecord,
    settings::TimerSettings,
    stats::HistoryStats,
    store::SessionStore,
};

const ENABLE_LOGS: bool = true;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Holds the ticker task. Aborts it when the last controller clone goes away
/// so no tick can outlive its owner.
struct TickerSlot(Mutex<Option<JoinHandle<()>>>);

impl Drop for TickerSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.0.get_mut().take() {
            handle.abort();
        }
    }
}

/// Owner of the session timer. Every transition goes through the state mutex,
/// so user calls and ticks never interleave.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<TickerSlot>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
}

impl TimerController {
    /// Seeds history from `store`. A failed load is logged and the timer starts
    /// with an empty history.
    pub fn new(store: Arc<dyn SessionStore>, settings: &TimerSettings) -> Self {
        let history = match store.load_all() {
            Ok(history) => history,
            Err(err) => {
                log_warn!("Starting with empty session history: {err}");
                Vec::new()
            }
        };
        log_info!("Loaded {} completed sessions", history.len());

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(TimerState::new(
                settings.default_duration_minutes,
                history,
            ))),
            store,
            events,
            ticker: Arc::new(TickerSlot(Mutex::new(None))),
            tick_interval: settings.tick_interval(),
            heartbeat_every_ticks: settings.heartbeat_every_ticks.max(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let guard = self.state.lock().await;
        TimerSnapshot::capture(&guard, Instant::now())
    }

    pub async fn history(&self) -> Vec<SessionRecord> {
        self.state.lock().await.history().to_vec()
    }

    pub async fn stats(&self, today: NaiveDate) -> HistoryStats {
        HistoryStats::from_history(self.state.lock().await.history(), today)
    }

    pub async fn start(&self) -> Result<TimerSnapshot, TransitionError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.start(now)?;

        // Spawned under the state lock so a concurrent stop cannot slip in
        // between the transition and the ticker.
        self.spawn_ticker().await;

        let snapshot = TimerSnapshot::capture(&state, now);
        drop(state);

        log_info!(
            "Session started for {} minutes",
            snapshot.selected_duration_minutes
        );
        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, TransitionError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.pause(now)?;
        let snapshot = TimerSnapshot::capture(&state, now);
        drop(state);

        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    pub async fn resume(&self) -> Result<TimerSnapshot, TransitionError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.resume(now)?;
        let snapshot = TimerSnapshot::capture(&state, now);
        drop(state);

        self.emit(TimerEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// Abandons the active session. Nothing is recorded or persisted.
    pub async fn stop(&self) -> TimerSnapshot {
        let mut state = self.state.lock().await;
        let discarded = state.stop();
        self.cancel_ticker().await;
        let snapshot = TimerSnapshot::capture(&state, Instant::now());
        drop(state);

        if discarded {
            log_info!("Session stopped before completion; not recorded");
            self.emit(TimerEvent::StateChanged(snapshot.clone()));
        } else {
            log_debug!("Stop requested with no active session");
        }
        snapshot
    }

    /// Returns `false` when `minutes` is not an allowed session length.
    pub async fn update_duration(&self, minutes: u32) -> bool {
        let mut state = self.state.lock().await;
        if !state.update_duration(minutes) {
            log_warn!("Refusing unsupported session length of {minutes} minutes");
            return false;
        }
        let snapshot = TimerSnapshot::capture(&state, Instant::now());
        drop(state);

        self.emit(TimerEvent::StateChanged(snapshot));
        true
    }

    /// Cancels the ticker without touching state. Dropping the last clone does
    /// the same.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.0.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let store = self.store.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;
        let heartbeat_every = self.heartbeat_every_ticks;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks: u32 = 0;

            loop {
                interval.tick().await;

                let mut guard = state.lock().await;
                let now = Instant::now();
                match guard.tick(now) {
                    TickOutcome::Ignored => {
                        // Paused sessions keep the ticker alive; idle ones end it.
                        if guard.status() == TimerStatus::Idle {
                            break;
                        }
                    }
                    TickOutcome::Running { .. } => {
                        ticks = ticks.wrapping_add(1);
                        if ticks % heartbeat_every == 0 {
                            let snapshot = TimerSnapshot::capture(&guard, now);
                            let _ = events.send(TimerEvent::Heartbeat(snapshot));
                        }
                    }
                    TickOutcome::Completed(record) => {
                        log_info!(
                            "Session {} completed after {} seconds",
                            record.id,
                            record.duration_seconds
                        );

                        // Still holding the lock: history is written before
                        // anyone can observe the settled idle state.
                        persist_history(store.clone(), guard.history().to_vec(), &events).await;

                        let snapshot = TimerSnapshot::capture(&guard, Instant::now());
                        drop(guard);

                        let _ = events.send(TimerEvent::SessionCompleted { record });
                        let _ = events.send(TimerEvent::StateChanged(snapshot));
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.0.lock().await.take() {
            handle.abort();
        }
    }

    fn emit(&self, event: TimerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

async fn persist_history(
    store: Arc<dyn SessionStore>,
    history: Vec<SessionRecord>,
    events: &broadcast::Sender<TimerEvent>,
) {
    let count = history.len();
    let message = match task::spawn_blocking(move || store.save_all(&history)).await {
        Ok(Ok(())) => {
            log_info!("Persisted {count} sessions");
            return;
        }
        Ok(Err(err)) => err.to_string(),
        Err(join_err) => format!("history writer panicked: {join_err}"),
    };

    log_error!("Failed to persist session history: {message}");
    let _ = events.send(TimerEvent::PersistenceFailed { message });
}
