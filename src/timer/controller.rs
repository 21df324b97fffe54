use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};

use crate::db::models::Feeling;
use crate::{log_debug, log_warn};

use super::{
    error::TimerError,
    phase_timer::{PhaseTimer, TimerSignal},
    state::{Phase, PhaseSlot, TimerConfig, TimerState},
};

const ENABLE_LOGS: bool = true;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TimerEvent {
    Tick {
        remaining_seconds: u32,
    },
    PhaseCompleted {
        finished: Phase,
        next: Phase,
        remaining_seconds: u32,
    },
    /// A session log write failed; the countdown carried on regardless.
    PersistenceFailed {
        message: String,
    },
}

impl From<TimerSignal> for TimerEvent {
    fn from(signal: TimerSignal) -> Self {
        match signal {
            TimerSignal::Tick { remaining_seconds } => TimerEvent::Tick { remaining_seconds },
            TimerSignal::PhaseCompleted {
                finished,
                next,
                remaining_seconds,
            } => TimerEvent::PhaseCompleted {
                finished,
                next,
                remaining_seconds,
            },
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub config: TimerConfig,
    pub label: String,
    pub countdown: String,
}

/// Async owner of the [`PhaseTimer`]: serialises every call through one lock
/// and drives `tick()` from a tokio interval while the countdown runs.
#[derive(Clone)]
pub struct TimerController {
    timer: Arc<Mutex<PhaseTimer>>,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(timer: PhaseTimer, tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            timer: Arc::new(Mutex::new(timer)),
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let timer = self.timer.lock().await;
        let state = timer.state().clone();
        TimerSnapshot {
            label: state.slot.label(),
            countdown: state.countdown_label(),
            config: *timer.config(),
            state,
        }
    }

    pub async fn start(&self) -> Result<bool, TimerError> {
        let outcome = {
            let mut timer = self.timer.lock().await;
            let outcome = timer.start();
            publish(&self.events, &mut timer, &outcome);
            outcome
        };

        // A failed log write still leaves the countdown running.
        if !matches!(outcome, Ok(false)) {
            self.spawn_ticker().await;
        }
        outcome
    }

    pub async fn pause(&self) -> bool {
        let paused = self.timer.lock().await.pause();
        self.cancel_ticker().await;
        paused
    }

    /// Start when idle, pause when running.
    pub async fn toggle(&self) -> Result<bool, TimerError> {
        let running = self.timer.lock().await.state().is_running;
        if running {
            Ok(self.pause().await)
        } else {
            self.start().await
        }
    }

    pub async fn reset(&self, from_feedback: bool) {
        {
            let mut timer = self.timer.lock().await;
            timer.reset(from_feedback);
            publish(&self.events, &mut timer, &Ok(true));
        }
        self.cancel_ticker().await;
    }

    pub async fn adjust(&self, delta_minutes: i32) -> u32 {
        let mut timer = self.timer.lock().await;
        timer.adjust(delta_minutes);
        publish(&self.events, &mut timer, &Ok(true));
        timer.state().remaining_seconds
    }

    pub async fn record_feedback(&self, feeling: Feeling) -> Result<bool, TimerError> {
        let outcome = {
            let mut timer = self.timer.lock().await;
            let outcome = timer.record_feedback(feeling);
            publish(&self.events, &mut timer, &outcome);
            outcome
        };

        if !matches!(outcome, Ok(false)) {
            self.cancel_ticker().await;
        }
        outcome
    }

    /// Apply new durations. An idle timer with no session in flight is reset
    /// so the new length shows straight away.
    pub async fn apply_config(&self, config: TimerConfig) -> Result<(), TimerError> {
        let mut timer = self.timer.lock().await;
        timer.configure(config)?;

        let state = timer.state();
        if !state.is_running && state.session_start_time.is_none() {
            match state.slot {
                PhaseSlot::Committed(Phase::Focus) => timer.reset(false),
                PhaseSlot::PendingNext(_) => timer.reset(true),
                PhaseSlot::Committed(_) => {}
            }
        }
        publish(&self.events, &mut timer, &Ok(true));
        Ok(())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let timer = self.timer.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                let mut guard = timer.lock().await;
                let outcome = guard.tick();
                publish(&events, &mut guard, &outcome);

                if !guard.state().is_running {
                    log_debug!("ticker stopping at {}", guard.state().countdown_label());
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

fn publish(
    events: &broadcast::Sender<TimerEvent>,
    timer: &mut PhaseTimer,
    outcome: &Result<bool, TimerError>,
) {
    for signal in timer.drain_signals() {
        // No subscribers is fine; the state is still readable via snapshot.
        let _ = events.send(signal.into());
    }

    if let Err(err) = outcome {
        log_warn!("{err}");
        let _ = events.send(TimerEvent::PersistenceFailed {
            message: err.to_string(),
        });
    }
}
