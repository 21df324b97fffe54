use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::{log_error, log_info};

pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use models::{Feeling, SessionRecord};
pub use repositories::sessions::DEFAULT_REPORT_LIMIT;
pub use repositories::settings::SettingKey;
pub use repositories::stats::DailyFocus;

use migrations::run_migrations;

const ENABLE_LOGS: bool = true;
const WORKER_NAME: &str = "pomotimer-db";

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Message {
    Run(Job),
    Stop,
}

/// Open the session log file and bring its schema up to date.
fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open session log {}", path.display()))?;

    // Not fatal: the default rollback journal works, just with less concurrency.
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        log_error!("journal_mode=WAL refused for {}: {err}", path.display());
    }

    run_migrations(&mut conn).context("failed to migrate session log schema")?;
    Ok(conn)
}

/// Worker body: report whether the file opened, then run jobs until told to stop.
fn serve(path: PathBuf, opened: mpsc::Sender<Result<()>>, inbox: mpsc::Receiver<Message>) {
    let mut conn = match open_connection(&path) {
        Ok(conn) => conn,
        Err(err) => {
            let _ = opened.send(Err(err));
            return;
        }
    };
    if opened.send(Ok(())).is_err() {
        return;
    }

    for message in inbox {
        match message {
            Message::Run(job) => job(&mut conn),
            Message::Stop => break,
        }
    }
    log_info!("{WORKER_NAME} stopped");
}

/// Shared by every clone; dropping the last one stops and joins the thread.
struct Worker {
    outbox: mpsc::Sender<Message>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let thread = self
            .thread
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(thread) = thread else {
            return;
        };

        // A worker that failed to open the file has already returned.
        let _ = self.outbox.send(Message::Stop);
        if thread.join().is_err() {
            log_error!("{WORKER_NAME} panicked");
        }
    }
}

/// Handle to the SQLite file holding the session log and settings.
///
/// One worker thread owns the connection; clones share it. Async callers go
/// through [`Database::execute`], the synchronous timer through
/// [`Database::execute_blocking`].
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
}

impl Database {
    /// Spawn the worker and wait until the file is open and migrated.
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let (outbox, inbox) = mpsc::channel();
        let (opened_tx, opened_rx) = mpsc::channel();
        let worker_path = db_path.clone();

        let thread = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || serve(worker_path, opened_tx, inbox))
            .context("failed to spawn session log worker")?;

        let worker = Worker {
            outbox,
            thread: Mutex::new(Some(thread)),
        };
        opened_rx
            .recv()
            .map_err(|_| anyhow!("{WORKER_NAME} exited before opening the session log"))??;

        log_info!("session log ready at {}", db_path.display());
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.submit(Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                log_error!("session log caller went away before its reply");
            }
        }))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("{WORKER_NAME} dropped the job without replying"))?
    }

    /// Run `task` on the worker and wait for it on the calling thread.
    ///
    /// Must not be called from the worker itself.
    pub fn execute_blocking<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();

        self.submit(Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                log_error!("session log caller went away before its reply");
            }
        }))?;

        reply_rx
            .recv()
            .map_err(|_| anyhow!("{WORKER_NAME} dropped the job without replying"))?
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.worker
            .outbox
            .send(Message::Run(job))
            .map_err(|_| anyhow!("{WORKER_NAME} is not running"))
    }
}
