use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;
use serde::Serialize;

use crate::db::{
    helpers::{format_date, parse_date},
    Database,
};

/// Closed sessions that started on one calendar day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyFocus {
    pub day: NaiveDate,
    pub sessions: u32,
    pub focus_seconds: u64,
}

impl Database {
    /// Per-day totals for `first..=last`, days without sessions omitted.
    pub async fn daily_focus(&self, first: NaiveDate, last: NaiveDate) -> Result<Vec<DailyFocus>> {
        let first = format_date(&first);
        let last = format_date(&last);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DATE(start_time) AS day,
                        COUNT(*) AS sessions,
                        SUM(strftime('%s', end_time) - strftime('%s', start_time)) AS seconds
                 FROM session_feedback
                 WHERE end_time IS NOT NULL
                   AND DATE(start_time) BETWEEN ?1 AND ?2
                 GROUP BY day
                 ORDER BY day",
            )?;

            let mut rows = stmt.query(params![first, last])?;
            let mut days = Vec::new();
            while let Some(row) = rows.next()? {
                let day: String = row.get("day")?;
                let sessions: i64 = row.get("sessions")?;
                let seconds: Option<i64> = row.get("seconds")?;
                days.push(DailyFocus {
                    day: parse_date(&day, "day")?,
                    sessions: u32::try_from(sessions).unwrap_or(u32::MAX),
                    focus_seconds: seconds.unwrap_or(0).max(0) as u64,
                });
            }
            Ok(days)
        })
        .await
        .context("failed to aggregate daily focus")
    }
}
