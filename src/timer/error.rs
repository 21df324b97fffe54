use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerError {
    /// A duration or session count was zero or negative. The previous
    /// configuration stays in effect.
    #[error("invalid configuration: {field} must be positive (got {value})")]
    Configuration { field: &'static str, value: i64 },

    /// The session log rejected a write. The timer state has already moved on.
    #[error("session log write failed: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

