use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::TimerError;

pub const MIN_ADJUSTED_SECONDS: u32 = 60;
pub const MAX_ADJUSTED_SECONDS: u32 = 7200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Focus,
    Rest,
    LongRest,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::Rest => "Rest",
            Phase::LongRest => "Long Rest",
        }
    }
}

/// Which phase the countdown belongs to.
///
/// `PendingNext` is the "Next: X" state left behind when a countdown elapses:
/// the label has advanced but the phase only commits on the next start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "phase")]
pub enum PhaseSlot {
    Committed(Phase),
    PendingNext(Phase),
}

impl PhaseSlot {
    pub fn phase(&self) -> Phase {
        match *self {
            PhaseSlot::Committed(phase) | PhaseSlot::PendingNext(phase) => phase,
        }
    }

    pub fn pending(&self) -> Option<Phase> {
        match *self {
            PhaseSlot::PendingNext(phase) => Some(phase),
            PhaseSlot::Committed(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PhaseSlot::Committed(phase) => phase.label().to_string(),
            PhaseSlot::PendingNext(phase) => format!("Next: {}", phase.label()),
        }
    }
}

impl Default for PhaseSlot {
    fn default() -> Self {
        PhaseSlot::Committed(Phase::Focus)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    pub focus_duration_seconds: u32,
    pub rest_duration_seconds: u32,
    pub long_rest_duration_seconds: u32,
    pub sessions_before_long_rest: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_duration_seconds: 30 * 60,
            rest_duration_seconds: 5 * 60,
            long_rest_duration_seconds: 15 * 60,
            sessions_before_long_rest: 4,
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<(), TimerError> {
        let fields = [
            ("focus_duration_seconds", self.focus_duration_seconds),
            ("rest_duration_seconds", self.rest_duration_seconds),
            ("long_rest_duration_seconds", self.long_rest_duration_seconds),
            ("sessions_before_long_rest", self.sessions_before_long_rest),
        ];

        for (field, value) in fields {
            if value == 0 {
                return Err(TimerError::Configuration {
                    field,
                    value: i64::from(value),
                });
            }
        }
        Ok(())
    }

    pub fn duration_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_duration_seconds,
            Phase::Rest => self.rest_duration_seconds,
            Phase::LongRest => self.long_rest_duration_seconds,
        }
    }

    /// The break that follows the `completed`-th finished Focus phase.
    pub fn rest_after(&self, completed: u32) -> Phase {
        if completed % self.sessions_before_long_rest == 0 {
            Phase::LongRest
        } else {
            Phase::Rest
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub slot: PhaseSlot,
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub completed_focus_sessions: u32,
    /// Wall-clock start of the Focus phase whose session record is still open.
    pub session_start_time: Option<NaiveDateTime>,
}

impl TimerState {
    pub fn new(config: &TimerConfig) -> Self {
        Self {
            slot: PhaseSlot::default(),
            remaining_seconds: config.focus_duration_seconds,
            is_running: false,
            completed_focus_sessions: 0,
            session_start_time: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.slot.phase()
    }

    /// `MM:SS`, minutes uncapped so a two hour countdown reads `120:00`.
    pub fn countdown_label(&self) -> String {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        format!("{minutes:02}:{seconds:02}")
    }
}

pub fn clamp_adjusted(remaining_seconds: u32, delta_minutes: i32) -> u32 {
    let adjusted = i64::from(remaining_seconds) + i64::from(delta_minutes) * 60;
    adjusted.clamp(
        i64::from(MIN_ADJUSTED_SECONDS),
        i64::from(MAX_ADJUSTED_SECONDS),
    ) as u32
}
