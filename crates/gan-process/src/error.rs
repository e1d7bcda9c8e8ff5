use std::time::Duration;
use thiserror::Error;

/// Faults the Process Manager itself can raise, distinct from the exit
/// status of the subprocess it ran (a non-zero exit is a successful
/// [`crate::ExecuteOutcome`], not a `ProcessError`).
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("queue wait exceeded {0:?}")]
    QueueTimeout(Duration),

    #[error("process manager has been shut down")]
    ShutDown,

    #[error("failed to spawn process: {0}")]
    Spawn(#[from] std::io::Error),
}
