use anyhow::Result;
use chrono::{Local, NaiveDateTime, SubsecRound};

use crate::db::models::Feeling;

/// Where the timer writes Focus intervals.
///
/// Records are keyed by their start time, which is unique per process because
/// a new Focus session can only open once the previous one was closed.
pub trait SessionLog: Send + Sync {
    fn open_session(&self, start_time: NaiveDateTime) -> Result<()>;

    fn close_session(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        feeling: Option<Feeling>,
    ) -> Result<()>;
}

pub trait Clock: Send + Sync {
    /// Local wall-clock time truncated to whole seconds, matching the
    /// precision of stored timestamps.
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}
