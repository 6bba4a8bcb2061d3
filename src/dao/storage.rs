use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend exists but a call to it failed.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable summary of the failing call.
        message: String,
        /// Backend-specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// No backend was ever configured. Distinct from [`StorageError::Unavailable`]
    /// so a missing configuration fails fast instead of masquerading as a
    /// transient outage.
    #[error("storage not configured: {0}")]
    Unconfigured(String),
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
