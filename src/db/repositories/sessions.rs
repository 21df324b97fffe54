use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use crate::db::{
    helpers::{format_timestamp, parse_feeling, parse_optional_timestamp, parse_timestamp},
    models::{Feeling, SessionRecord},
    Database,
};
use crate::timer::SessionLog;

pub const DEFAULT_REPORT_LIMIT: usize = 10;

fn row_to_session(row: &Row) -> Result<SessionRecord> {
    let start_time: String = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let feeling: Option<String> = row.get("feeling")?;

    Ok(SessionRecord {
        start_time: parse_timestamp(&start_time, "start_time")?,
        end_time: parse_optional_timestamp(end_time, "end_time")?,
        feeling: parse_feeling(feeling)?,
    })
}

fn insert_open(conn: &Connection, start_time: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO session_feedback (start_time, end_time, feeling)
         VALUES (?1, NULL, NULL)",
        params![start_time],
    )
    .context("failed to insert session")?;
    Ok(())
}

/// Close the open record started at `start_time`. Returns the number of rows
/// updated; zero when nothing matched, which is not an error.
fn close_open(
    conn: &Connection,
    start_time: &str,
    end_time: &str,
    feeling: Option<&'static str>,
) -> Result<usize> {
    conn.execute(
        "UPDATE session_feedback
         SET end_time = ?1,
             feeling = ?2
         WHERE start_time = ?3 AND end_time IS NULL",
        params![end_time, feeling, start_time],
    )
    .context("failed to close session")
}

fn query_sessions(conn: &Connection, sql: &str, limit: i64) -> Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params![limit])?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(row_to_session(row)?);
    }
    Ok(sessions)
}

impl Database {
    /// Insert a complete row, closed or not.
    pub async fn insert_session(&self, record: &SessionRecord) -> Result<()> {
        let start_time = format_timestamp(&record.start_time);
        let end_time = record.end_time.as_ref().map(format_timestamp);
        let feeling = record.feeling.map(|f| f.as_str());
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO session_feedback (start_time, end_time, feeling)
                 VALUES (?1, ?2, ?3)",
                params![start_time, end_time, feeling],
            )
            .context("failed to insert session")?;
            Ok(())
        })
        .await
    }

    /// Most recent sessions first, open ones included.
    pub async fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            query_sessions(
                conn,
                "SELECT start_time, end_time, feeling
                 FROM session_feedback
                 WHERE start_time IS NOT NULL
                 ORDER BY start_time DESC
                 LIMIT ?1",
                limit,
            )
        })
        .await
    }

    /// Sessions that were never closed, oldest first.
    pub async fn open_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.execute(|conn| {
            query_sessions(
                conn,
                "SELECT start_time, end_time, feeling
                 FROM session_feedback
                 WHERE start_time IS NOT NULL AND end_time IS NULL
                 ORDER BY start_time ASC
                 LIMIT ?1",
                -1,
            )
        })
        .await
    }
}

impl SessionLog for Database {
    fn open_session(&self, start_time: NaiveDateTime) -> Result<()> {
        let start_time = format_timestamp(&start_time);
        self.execute_blocking(move |conn| insert_open(conn, &start_time))
    }

    fn close_session(
        &self,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        feeling: Option<Feeling>,
    ) -> Result<()> {
        let start_time = format_timestamp(&start_time);
        let end_time = format_timestamp(&end_time);
        self.execute_blocking(move |conn| {
            close_open(conn, &start_time, &end_time, feeling.map(|f| f.as_str()))?;
            Ok(())
        })
    }
}
