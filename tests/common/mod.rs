#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use pomotimer_lib::db::{Feeling, SessionRecord};
use pomotimer_lib::timer::{Clock, SessionLog, TimerConfig};

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Seconds-long phases so whole cycles fit in a test.
pub fn short_config() -> TimerConfig {
    TimerConfig {
        focus_duration_seconds: 5,
        rest_duration_seconds: 3,
        long_rest_duration_seconds: 4,
        sessions_before_long_rest: 2,
    }
}

#[derive(Default)]
pub struct MemoryLog {
    pub records: Mutex<Vec<SessionRecord>>,
    pub fail: bool,
}

impl MemoryLog {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl SessionLog for MemoryLog {
    fn open_session(&self, start_time: NaiveDateTime) -> Result<()> {
        if self.fail {
            bail!("read-only file system");
        }
        self.records
            .lock()
            .unwrap()
            .push(SessionRecord::open(start_time));
        Ok(())
    }

    fn close_session(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        feeling: Option<Feeling>,
    ) -> Result<()> {
        if self.fail {
            bail!("read-only file system");
        }
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.start_time == start_time && r.is_open())
        {
            record.end_time = Some(end_time);
            record.feeling = feeling;
        }
        Ok(())
    }
}

/// Moves forward a fixed step on every read.
pub struct StepClock {
    next: Mutex<NaiveDateTime>,
    step: Duration,
}

impl StepClock {
    pub fn new(origin: NaiveDateTime, step: Duration) -> Arc<Self> {
        Arc::new(Self {
            next: Mutex::new(origin),
            step,
        })
    }
}

impl Clock for StepClock {
    fn now(&self) -> NaiveDateTime {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + self.step;
        now
    }
}
