use std::{env, path::PathBuf};

use anyhow::{anyhow, Context, Result};

const DATA_DIR_ENV: &str = "POMOTIMER_DATA_DIR";
const DEBUG_ENV: &str = "POMOTIMER_DEBUG";
const DB_FILE_NAME: &str = "pomotimer.sqlite3";

/// Resolved runtime locations and switches read from the environment.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    pub fn resolve() -> Result<Self> {
        let data_dir = match env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or_else(|| anyhow!("no platform data directory; set {DATA_DIR_ENV}"))?
                .join("pomotimer"),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        Ok(Self {
            db_path: data_dir.join(DB_FILE_NAME),
            data_dir,
        })
    }
}

pub fn debug_mode() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
