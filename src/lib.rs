pub mod commands;
pub mod db;
pub mod settings;
pub mod shell;
pub mod stats;
pub mod stretch;
pub mod timer;
pub mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};

use commands::AppState;
use db::Database;
use settings::SettingsStore;
use stats::StatsAggregator;
use timer::{Clock, PhaseTimer, SessionLog, SystemClock, TimerController};
use utils::paths::{debug_mode, AppPaths};

const ENABLE_LOGS: bool = true;

pub fn tick_interval(debug: bool) -> Duration {
    if debug {
        Duration::from_millis(100)
    } else {
        Duration::from_secs(1)
    }
}

pub fn run() -> Result<()> {
    let debug = debug_mode();
    utils::logging::init(debug);
    log_info!("pomotimer starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let paths = AppPaths::resolve()?;
        log_info!("data directory: {}", paths.data_dir.display());
        let database = Database::new(paths.db_path.clone())?;

        // Sessions left open by a crash stay open; they are only reported.
        let stats = StatsAggregator::new(database.clone());
        for session in stats.open_sessions().await? {
            log_warn!(
                "Session started {} was never closed",
                session.start_time.format("%Y-%m-%d %H:%M:%S")
            );
        }

        let settings = SettingsStore::new(database.clone());
        let config = match settings.load().await {
            Ok(config) => config,
            Err(err) => {
                log_warn!("Ignoring stored settings: {err:#}");
                timer::TimerConfig::default()
            }
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let log: Arc<dyn SessionLog> = Arc::new(database.clone());
        let phase_timer = PhaseTimer::new(config, log, clock.clone())?;
        let controller = TimerController::new(phase_timer, tick_interval(debug));

        shell::run_shell(AppState {
            timer: controller,
            settings,
            stats,
            clock,
        })
        .await
    })
}
