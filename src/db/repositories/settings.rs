use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::db::Database;

/// Keys of the `settings` table. The names are shared with databases written
/// by earlier releases, hence the break/rest mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    FocusDuration,
    ShortBreakDuration,
    LongBreakDuration,
    SessionsBeforeLongBreak,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::FocusDuration,
        SettingKey::ShortBreakDuration,
        SettingKey::LongBreakDuration,
        SettingKey::SessionsBeforeLongBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::FocusDuration => "focus_duration",
            SettingKey::ShortBreakDuration => "short_break_duration",
            SettingKey::LongBreakDuration => "long_break_duration",
            SettingKey::SessionsBeforeLongBreak => "sessions_before_long_break",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl Database {
    pub async fn get_setting(&self, key: SettingKey, default: i64) -> Result<i64> {
        self.execute(move |conn| {
            let value: Option<i64> = conn
                .query_row(
                    "SELECT value FROM settings WHERE key = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .with_context(|| format!("failed to read setting {}", key.as_str()))?;
            Ok(value.unwrap_or(default))
        })
        .await
    }

    /// Upsert several settings in one transaction.
    pub async fn save_settings(&self, values: Vec<(SettingKey, i64)>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for (key, value) in values {
                tx.execute(
                    "INSERT INTO settings (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key.as_str(), value],
                )
                .with_context(|| format!("failed to save setting {}", key.as_str()))?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn save_setting(&self, key: SettingKey, value: i64) -> Result<()> {
        self.save_settings(vec![(key, value)]).await
    }

    pub async fn delete_setting(&self, key: SettingKey) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM settings WHERE key = ?1",
                params![key.as_str()],
            )
            .with_context(|| format!("failed to delete setting {}", key.as_str()))?;
            Ok(())
        })
        .await
    }
}
