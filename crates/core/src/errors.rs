use thiserror::Error;

/// Unified error type for the scheduler.
///
/// The taxonomy matters to callers: configuration errors are fatal to a
/// single executor-creation attempt but never to the process, not-found
/// errors are distinguishable sentinels so that "delete of something
/// already gone" can be treated as success, and remote errors carry the
/// operation and target for diagnostics.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("executor not found: {0}")]
    ExecutorNotFound(String),

    #[error("executor config not found: {0}")]
    ExecutorConfigNotFound(String),

    #[error("executor kind not registered: {0}")]
    KindNotRegistered(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("remote {op} on {target} failed: {message}")]
    Remote {
        op: String,
        target: String,
        message: String,
    },

    #[error("worker pool for executor {0} saturated, submission timed out")]
    PoolSaturated(String),

    #[error("task canceled: {0}")]
    Canceled(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    pub fn remote(op: impl Into<String>, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            op: op.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Whether this error means "the thing does not exist", at any layer:
    /// missing KV document, missing executor, missing backend resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::ExecutorNotFound(_) | Self::ExecutorConfigNotFound(_)
        )
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
