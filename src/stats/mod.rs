//! Focus-time projections over the session log.
//!
//! Everything here is read-only. A session counts toward the day its
//! `start_time` falls on; open sessions are ignored.

mod heatmap;

pub use heatmap::{grid_start, Heatmap, HeatmapCell, MAX_INTENSITY};

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::db::{DailyFocus, Database, SessionRecord};

pub const COUNT_WINDOW_DAYS: u64 = 365;
pub const AVERAGE_WINDOW_DAYS: u64 = 7;

const DAY_START_HOUR: u32 = 5;
const DAY_END_HOUR: u32 = 23;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FocusSummary {
    pub today_minutes: u64,
    pub yesterday_minutes: u64,
    /// Mean daily minutes over the seven days ending today, idle days included.
    pub last_7_days_average: f64,
}

impl FocusSummary {
    pub fn from_days(today: NaiveDate, days: &[DailyFocus]) -> Self {
        let minutes_on = |day: Option<NaiveDate>| {
            day.and_then(|day| days.iter().find(|d| d.day == day))
                .map(|d| d.focus_seconds / 60)
                .unwrap_or(0)
        };

        let window_start = today - Days::new(AVERAGE_WINDOW_DAYS - 1);
        let window_seconds: u64 = days
            .iter()
            .filter(|d| d.day >= window_start && d.day <= today)
            .map(|d| d.focus_seconds)
            .sum();

        Self {
            today_minutes: minutes_on(Some(today)),
            yesterday_minutes: minutes_on(today.pred_opt()),
            last_7_days_average: window_seconds as f64 / 60.0 / AVERAGE_WINDOW_DAYS as f64,
        }
    }
}

/// Percent of the 05:00–23:00 working day that has elapsed at `now`.
pub fn day_progress(now: NaiveDateTime) -> u8 {
    let at = |hour| NaiveTime::from_hms_opt(hour, 0, 0).map(|time| now.date().and_time(time));
    let (Some(start), Some(end)) = (at(DAY_START_HOUR), at(DAY_END_HOUR)) else {
        return 0;
    };

    if now <= start {
        return 0;
    }
    if now >= end {
        return 100;
    }
    let elapsed = (now - start).num_seconds() as f64;
    let total = (end - start).num_seconds() as f64;
    (elapsed / total * 100.0) as u8
}

/// Read-side companion to the timer: summaries, daily counts and the report.
#[derive(Clone)]
pub struct StatsAggregator {
    db: Database,
}

impl StatsAggregator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn summary(&self, today: NaiveDate) -> Result<FocusSummary> {
        let first = today - Days::new(AVERAGE_WINDOW_DAYS - 1);
        let days = self.db.daily_focus(first, today).await?;
        Ok(FocusSummary::from_days(today, &days))
    }

    /// Closed-session count per day over the 365 days ending `today`.
    pub async fn daily_counts(&self, today: NaiveDate) -> Result<BTreeMap<NaiveDate, u32>> {
        let first = today - Days::new(COUNT_WINDOW_DAYS - 1);
        let days = self.db.daily_focus(first, today).await?;
        Ok(days.into_iter().map(|d| (d.day, d.sessions)).collect())
    }

    /// The grid reaches back past the 365-day count window to its leading
    /// Monday, so it queries its own range.
    pub async fn heatmap(&self, today: NaiveDate) -> Result<Heatmap> {
        let days = self.db.daily_focus(grid_start(today), today).await?;
        let counts: BTreeMap<_, _> = days.into_iter().map(|d| (d.day, d.sessions)).collect();
        Ok(Heatmap::build(today, &counts))
    }

    pub async fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        self.db.recent_sessions(limit).await
    }

    pub async fn open_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.db.open_sessions().await
    }
}
