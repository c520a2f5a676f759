use thiserror::Error;

/// Failure taxonomy for the screenshot-to-task pipeline.
///
/// Only `Authentication` and `Listing` terminate a whole request; the
/// per-item variants are logged and contained by the orchestrator.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("failed to list screenshots: {0}")]
    Listing(String),

    #[error("cache lookup failed: {0}")]
    CacheLookup(String),

    #[error("cache write failed: {0}")]
    CacheWrite(String),

    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskError {
    /// Whether this failure aborts the whole request rather than a single item.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskError::Authentication(_) | TaskError::Listing(_))
    }
}
