use std::sync::Arc;

use serde::Serialize;

use crate::db::models::Feeling;
use crate::{log_debug, log_info};

use super::{
    error::TimerError,
    session_log::{Clock, SessionLog},
    state::{clamp_adjusted, Phase, PhaseSlot, TimerConfig, TimerState},
};

const ENABLE_LOGS: bool = true;

/// Signals queued by the timer for whoever owns it to render.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TimerSignal {
    /// `remaining_seconds` changed.
    Tick { remaining_seconds: u32 },
    /// A countdown reached zero; `next` is now pending.
    PhaseCompleted {
        finished: Phase,
        next: Phase,
        remaining_seconds: u32,
    },
}

/// The Focus / Rest / LongRest state machine.
///
/// Operations that find nothing to do return `Ok(false)`. A session log
/// failure is returned as [`TimerError::Persistence`] after the state change
/// and its signals have already been applied.
pub struct PhaseTimer {
    config: TimerConfig,
    state: TimerState,
    log: Arc<dyn SessionLog>,
    clock: Arc<dyn Clock>,
    signals: Vec<TimerSignal>,
}

impl PhaseTimer {
    pub fn new(
        config: TimerConfig,
        log: Arc<dyn SessionLog>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TimerError> {
        config.validate()?;
        Ok(Self {
            state: TimerState::new(&config),
            config,
            log,
            clock,
            signals: Vec::new(),
        })
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn drain_signals(&mut self) -> Vec<TimerSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Swap in new durations. They take effect at the next reset or
    /// transition; a countdown already in progress is left alone.
    pub fn configure(&mut self, config: TimerConfig) -> Result<(), TimerError> {
        config.validate()?;
        self.config = config;
        log_debug!("timer reconfigured: {:?}", self.config);
        Ok(())
    }

    pub fn start(&mut self) -> Result<bool, TimerError> {
        if self.state.is_running {
            return Ok(false);
        }

        let phase = self.state.slot.phase();
        self.state.slot = PhaseSlot::Committed(phase);
        self.state.is_running = true;

        if phase == Phase::Focus && self.state.session_start_time.is_none() {
            let start_time = self.clock.now();
            self.state.session_start_time = Some(start_time);
            log_info!("focus session opened at {start_time}");
            self.log
                .open_session(start_time)
                .map_err(TimerError::Persistence)?;
        }

        Ok(true)
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.state.is_running = false;
        true
    }

    pub fn tick(&mut self) -> Result<bool, TimerError> {
        if !self.state.is_running {
            return Ok(false);
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds == 0 {
            self.state.is_running = false;
            self.complete_phase()?;
        } else {
            self.signals.push(TimerSignal::Tick {
                remaining_seconds: self.state.remaining_seconds,
            });
        }

        Ok(true)
    }

    /// Stop the countdown. A bare reset always lands on a fresh Focus; one
    /// coming from feedback keeps a pending phase and shows its length.
    pub fn reset(&mut self, from_feedback: bool) {
        self.state.is_running = false;
        if !from_feedback {
            self.state.slot = PhaseSlot::Committed(Phase::Focus);
        }
        self.state.remaining_seconds = match self.state.slot.pending() {
            Some(pending) => self.config.duration_for(pending),
            None => self.config.focus_duration_seconds,
        };
        self.signals.push(TimerSignal::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });
    }

    pub fn adjust(&mut self, delta_minutes: i32) {
        self.state.remaining_seconds = clamp_adjusted(self.state.remaining_seconds, delta_minutes);
        self.signals.push(TimerSignal::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });
    }

    pub fn record_feedback(&mut self, feeling: Feeling) -> Result<bool, TimerError> {
        let Some(start_time) = self.state.session_start_time.take() else {
            return Ok(false);
        };

        let end_time = self.clock.now();
        self.reset(true);
        log_info!("focus session {start_time} closed by feedback ({})", feeling.as_str());

        self.log
            .close_session(start_time, end_time, Some(feeling))
            .map_err(TimerError::Persistence)?;
        Ok(true)
    }

    fn complete_phase(&mut self) -> Result<(), TimerError> {
        let finished = self.state.slot.phase();
        let mut closed = None;

        let next = match finished {
            Phase::Focus => {
                closed = self.state.session_start_time.take();
                self.state.completed_focus_sessions += 1;
                self.config.rest_after(self.state.completed_focus_sessions)
            }
            Phase::Rest | Phase::LongRest => Phase::Focus,
        };

        self.state.slot = PhaseSlot::PendingNext(next);
        self.state.remaining_seconds = self.config.duration_for(next);
        self.signals.push(TimerSignal::PhaseCompleted {
            finished,
            next,
            remaining_seconds: self.state.remaining_seconds,
        });
        log_info!(
            "{} finished, next: {} ({} completed focus sessions)",
            finished.label(),
            next.label(),
            self.state.completed_focus_sessions
        );

        if let Some(start_time) = closed {
            self.log
                .close_session(start_time, self.clock.now(), None)
                .map_err(TimerError::Persistence)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::*;

    #[derive(Default)]
    struct MemoryLog {
        rows: Mutex<Vec<(NaiveDateTime, Option<NaiveDateTime>, Option<Feeling>)>>,
        fail: bool,
    }

    impl MemoryLog {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn rows(&self) -> Vec<(NaiveDateTime, Option<NaiveDateTime>, Option<Feeling>)> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl SessionLog for MemoryLog {
        fn open_session(&self, start_time: NaiveDateTime) -> Result<()> {
            if self.fail {
                bail!("disk full");
            }
            self.rows.lock().unwrap().push((start_time, None, None));
            Ok(())
        }

        fn close_session(
            &self,
            start_time: NaiveDateTime,
            end_time: NaiveDateTime,
            feeling: Option<Feeling>,
        ) -> Result<()> {
            if self.fail {
                bail!("disk full");
            }
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut() {
                if row.0 == start_time && row.1.is_none() {
                    row.1 = Some(end_time);
                    row.2 = feeling;
                }
            }
            Ok(())
        }
    }

    /// Advances one second every time it is read.
    struct SteppingClock {
        next: Mutex<NaiveDateTime>,
    }

    impl SteppingClock {
        fn new() -> Self {
            let origin = NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap();
            Self {
                next: Mutex::new(origin),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> NaiveDateTime {
            let mut next = self.next.lock().unwrap();
            let now = *next;
            *next = now + Duration::seconds(1);
            now
        }
    }

    fn config(focus: u32, rest: u32, long_rest: u32, every: u32) -> TimerConfig {
        TimerConfig {
            focus_duration_seconds: focus,
            rest_duration_seconds: rest,
            long_rest_duration_seconds: long_rest,
            sessions_before_long_rest: every,
        }
    }

    fn timer_with(config: TimerConfig) -> (PhaseTimer, Arc<MemoryLog>) {
        let log = Arc::new(MemoryLog::default());
        let timer = PhaseTimer::new(config, log.clone(), Arc::new(SteppingClock::new())).unwrap();
        (timer, log)
    }

    fn run_out(timer: &mut PhaseTimer) {
        while timer.state().is_running {
            timer.tick().unwrap();
        }
    }

    #[test]
    fn initial_state() {
        let (timer, log) = timer_with(config(1500, 300, 900, 4));
        let state = timer.state();
        assert_eq!(state.slot, PhaseSlot::Committed(Phase::Focus));
        assert_eq!(state.remaining_seconds, 1500);
        assert!(!state.is_running);
        assert_eq!(state.completed_focus_sessions, 0);
        assert!(state.session_start_time.is_none());
        assert!(log.rows().is_empty());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let log = Arc::new(MemoryLog::default());
        let result = PhaseTimer::new(config(0, 1, 1, 1), log, Arc::new(SteppingClock::new()));
        assert!(matches!(result, Err(TimerError::Configuration { .. })));
    }

    #[test]
    fn configure_keeps_previous_on_error() {
        let (mut timer, _) = timer_with(config(5, 3, 4, 2));
        let err = timer.configure(config(5, 3, 4, 0)).unwrap_err();
        assert!(matches!(
            err,
            TimerError::Configuration {
                field: "sessions_before_long_rest",
                ..
            }
        ));
        assert_eq!(timer.config(), &config(5, 3, 4, 2));

        timer.configure(config(10, 3, 4, 2)).unwrap();
        assert_eq!(timer.state().remaining_seconds, 5);
        timer.reset(false);
        assert_eq!(timer.state().remaining_seconds, 10);
    }

    #[test]
    fn countdown_strictly_decreases_then_completes() {
        let (mut timer, _) = timer_with(config(5, 3, 4, 2));
        assert!(timer.start().unwrap());

        let mut last = timer.state().remaining_seconds;
        while timer.state().is_running {
            timer.tick().unwrap();
            if timer.state().is_running {
                assert!(timer.state().remaining_seconds < last);
                last = timer.state().remaining_seconds;
            }
        }
        assert_eq!(last, 1);

        let signals = timer.drain_signals();
        assert_eq!(
            signals,
            vec![
                TimerSignal::Tick { remaining_seconds: 4 },
                TimerSignal::Tick { remaining_seconds: 3 },
                TimerSignal::Tick { remaining_seconds: 2 },
                TimerSignal::Tick { remaining_seconds: 1 },
                TimerSignal::PhaseCompleted {
                    finished: Phase::Focus,
                    next: Phase::Rest,
                    remaining_seconds: 3,
                },
            ]
        );
        assert!(!timer.tick().unwrap());
    }

    #[test]
    fn long_rest_cadence() {
        let (mut timer, _) = timer_with(config(2, 1, 1, 2));
        let mut pending = Vec::new();
        for _ in 0..4 {
            // focus
            timer.start().unwrap();
            run_out(&mut timer);
            pending.push(timer.state().slot.pending().unwrap());
            // break
            timer.start().unwrap();
            run_out(&mut timer);
            assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::Focus));
        }
        assert_eq!(
            pending,
            vec![Phase::Rest, Phase::LongRest, Phase::Rest, Phase::LongRest]
        );
        assert_eq!(timer.state().completed_focus_sessions, 4);
    }

    #[test]
    fn adjust_clamps_in_any_state() {
        let (mut timer, _) = timer_with(config(60, 3, 4, 2));
        timer.adjust(-5);
        assert_eq!(timer.state().remaining_seconds, 60);

        timer.adjust(200);
        assert_eq!(timer.state().remaining_seconds, 7200);
        timer.adjust(5);
        assert_eq!(timer.state().remaining_seconds, 7200);

        timer.start().unwrap();
        timer.adjust(-1);
        assert_eq!(timer.state().remaining_seconds, 7140);
        assert!(timer.state().is_running);
        assert_eq!(timer.state().phase(), Phase::Focus);
    }

    #[test]
    fn pause_leaves_remaining_untouched() {
        let (mut timer, log) = timer_with(config(10, 3, 4, 2));
        timer.start().unwrap();
        timer.tick().unwrap();
        timer.tick().unwrap();

        assert!(timer.pause());
        assert!(!timer.state().is_running);
        assert_eq!(timer.state().remaining_seconds, 8);
        assert!(!timer.tick().unwrap());
        assert_eq!(timer.state().remaining_seconds, 8);
        assert!(!timer.pause());

        // resuming the same focus phase does not open a second record
        assert!(timer.start().unwrap());
        assert_eq!(log.rows().len(), 1);
    }

    #[test]
    fn start_while_running_is_a_noop() {
        let (mut timer, log) = timer_with(config(10, 3, 4, 2));
        assert!(timer.start().unwrap());
        let started = timer.state().session_start_time;
        assert!(!timer.start().unwrap());
        assert_eq!(timer.state().session_start_time, started);
        assert_eq!(log.rows().len(), 1);
    }

    #[test]
    fn focus_completion_closes_the_open_record() {
        let (mut timer, log) = timer_with(config(3, 3, 4, 2));
        timer.start().unwrap();
        let start = timer.state().session_start_time.unwrap();
        assert_eq!(log.rows(), vec![(start, None, None)]);

        run_out(&mut timer);
        let rows = log.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, start);
        assert!(rows[0].1.unwrap() >= start);
        assert!(timer.state().session_start_time.is_none());

        // rest phases never open records
        timer.start().unwrap();
        assert!(timer.state().session_start_time.is_none());
        assert_eq!(log.rows().len(), 1);
    }

    #[test]
    fn feedback_closes_record_with_feeling() {
        let (mut timer, log) = timer_with(config(30, 3, 4, 2));
        timer.start().unwrap();
        timer.tick().unwrap();
        let start = timer.state().session_start_time.unwrap();

        assert!(timer.record_feedback(Feeling::Happy).unwrap());
        let rows = log.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, start);
        assert!(rows[0].1.unwrap() >= start);
        assert_eq!(rows[0].2, Some(Feeling::Happy));

        let state = timer.state();
        assert!(state.session_start_time.is_none());
        assert!(!state.is_running);
        assert_eq!(state.remaining_seconds, 30);
        assert_eq!(state.slot, PhaseSlot::Committed(Phase::Focus));
        assert_eq!(state.completed_focus_sessions, 0);

        assert!(!timer.record_feedback(Feeling::Sad).unwrap());
    }

    #[test]
    fn bare_reset_leaves_record_open_and_session_running() {
        let (mut timer, log) = timer_with(config(30, 3, 4, 2));
        timer.start().unwrap();
        timer.tick().unwrap();
        timer.reset(false);

        assert_eq!(timer.state().remaining_seconds, 30);
        assert!(timer.state().session_start_time.is_some());
        assert_eq!(log.rows()[0].1, None);

        timer.start().unwrap();
        assert_eq!(log.rows().len(), 1);
    }

    #[test]
    fn reset_semantics_with_pending_phase() {
        let (mut timer, _) = timer_with(config(5, 3, 4, 2));
        timer.start().unwrap();
        run_out(&mut timer);
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::Rest));

        timer.adjust(10);
        timer.reset(true);
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::Rest));
        assert_eq!(timer.state().remaining_seconds, 3);

        timer.reset(false);
        assert_eq!(timer.state().slot, PhaseSlot::Committed(Phase::Focus));
        assert_eq!(timer.state().remaining_seconds, 5);
    }

    #[test]
    fn bare_reset_from_pending_long_rest_shows_focus_length() {
        let (mut timer, log) = timer_with(config(5, 3, 4, 1));
        timer.start().unwrap();
        run_out(&mut timer);
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::LongRest));
        assert_eq!(timer.state().remaining_seconds, 4);
        timer.drain_signals();

        timer.reset(false);
        assert_eq!(timer.state().slot, PhaseSlot::Committed(Phase::Focus));
        assert_eq!(timer.state().remaining_seconds, 5);
        assert_eq!(
            timer.drain_signals(),
            vec![TimerSignal::Tick {
                remaining_seconds: 5
            }]
        );

        // The next start opens a new focus session rather than a break.
        timer.start().unwrap();
        assert_eq!(timer.state().slot, PhaseSlot::Committed(Phase::Focus));
        assert_eq!(log.rows().len(), 2);
    }

    #[test]
    fn reset_stops_a_running_break() {
        let (mut timer, _) = timer_with(config(2, 3, 4, 2));
        timer.start().unwrap();
        run_out(&mut timer);
        timer.start().unwrap();
        assert_eq!(timer.state().slot, PhaseSlot::Committed(Phase::Rest));

        timer.reset(false);
        assert!(!timer.state().is_running);
        assert_eq!(timer.state().slot, PhaseSlot::Committed(Phase::Focus));
        assert_eq!(timer.state().remaining_seconds, 2);
    }

    #[test]
    fn five_three_four_two_walkthrough() {
        let (mut timer, log) = timer_with(config(5, 3, 4, 2));

        timer.start().unwrap();
        for _ in 0..5 {
            timer.tick().unwrap();
        }
        assert_eq!(timer.state().completed_focus_sessions, 1);
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::Rest));
        assert_eq!(timer.state().remaining_seconds, 3);
        assert!(timer.drain_signals().contains(&TimerSignal::PhaseCompleted {
            finished: Phase::Focus,
            next: Phase::Rest,
            remaining_seconds: 3,
        }));

        timer.start().unwrap();
        for _ in 0..3 {
            timer.tick().unwrap();
        }
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::Focus));
        assert_eq!(timer.state().remaining_seconds, 5);
        assert!(timer.drain_signals().contains(&TimerSignal::PhaseCompleted {
            finished: Phase::Rest,
            next: Phase::Focus,
            remaining_seconds: 5,
        }));

        timer.start().unwrap();
        for _ in 0..5 {
            timer.tick().unwrap();
        }
        assert_eq!(timer.state().completed_focus_sessions, 2);
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::LongRest));
        assert_eq!(timer.state().remaining_seconds, 4);

        let rows = log.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.1.is_some()));
    }

    #[test]
    fn persistence_failure_does_not_roll_back() {
        let log = Arc::new(MemoryLog::failing());
        let mut timer =
            PhaseTimer::new(config(2, 3, 4, 2), log, Arc::new(SteppingClock::new())).unwrap();

        let err = timer.start().unwrap_err();
        assert!(matches!(err, TimerError::Persistence(_)));
        assert!(timer.state().is_running);
        assert!(timer.state().session_start_time.is_some());

        timer.tick().unwrap();
        let err = timer.tick().unwrap_err();
        assert!(matches!(err, TimerError::Persistence(_)));
        assert_eq!(timer.state().slot, PhaseSlot::PendingNext(Phase::Rest));
        assert_eq!(timer.state().completed_focus_sessions, 1);
        assert!(timer
            .drain_signals()
            .iter()
            .any(|signal| matches!(signal, TimerSignal::PhaseCompleted { .. })));
    }
}
