use anyhow::{Context, Result};

use crate::db::{Database, SettingKey};
use crate::timer::TimerConfig;
use crate::timer::TimerError;

/// Duration overrides stored in the `settings` table, read at startup and
/// written when the user saves.
#[derive(Clone)]
pub struct SettingsStore {
    db: Database,
}

fn value_for(key: SettingKey, config: &TimerConfig) -> u32 {
    match key {
        SettingKey::FocusDuration => config.focus_duration_seconds,
        SettingKey::ShortBreakDuration => config.rest_duration_seconds,
        SettingKey::LongBreakDuration => config.long_rest_duration_seconds,
        SettingKey::SessionsBeforeLongBreak => config.sessions_before_long_rest,
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, TimerError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(TimerError::Configuration { field, value })
}

impl SettingsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: SettingKey, default: i64) -> Result<i64> {
        self.db.get_setting(key, default).await
    }

    /// Stored overrides layered over the built-in defaults.
    pub async fn load(&self) -> Result<TimerConfig> {
        let defaults = TimerConfig::default();
        let mut values = [0i64; 4];
        for (slot, key) in values.iter_mut().zip(SettingKey::ALL) {
            *slot = self
                .get(key, i64::from(value_for(key, &defaults)))
                .await?;
        }

        let config = TimerConfig {
            focus_duration_seconds: positive("focus_duration_seconds", values[0])?,
            rest_duration_seconds: positive("rest_duration_seconds", values[1])?,
            long_rest_duration_seconds: positive("long_rest_duration_seconds", values[2])?,
            sessions_before_long_rest: positive("sessions_before_long_rest", values[3])?,
        };
        Ok(config)
    }

    pub async fn save(&self, config: &TimerConfig) -> Result<()> {
        config.validate()?;
        let values = SettingKey::ALL
            .into_iter()
            .map(|key| (key, i64::from(value_for(key, config))))
            .collect();
        self.db
            .save_settings(values)
            .await
            .context("failed to save timer settings")
    }

    /// Set a single key, validating the config it would produce first.
    pub async fn set(&self, key: SettingKey, value: i64) -> Result<TimerConfig> {
        let mut config = self.load().await?;
        let value = positive(key.as_str(), value)?;
        match key {
            SettingKey::FocusDuration => config.focus_duration_seconds = value,
            SettingKey::ShortBreakDuration => config.rest_duration_seconds = value,
            SettingKey::LongBreakDuration => config.long_rest_duration_seconds = value,
            SettingKey::SessionsBeforeLongBreak => config.sessions_before_long_rest = value,
        }
        self.db.save_setting(key, i64::from(value)).await?;
        Ok(config)
    }

    /// Drop every override so the defaults apply again.
    pub async fn reset(&self) -> Result<TimerConfig> {
        for key in SettingKey::ALL {
            self.db.delete_setting(key).await?;
        }
        Ok(TimerConfig::default())
    }
}
