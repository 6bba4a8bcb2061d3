//! Error types shared by the REST storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`RestDaoError`] failures.
pub type RestResult<T> = Result<T, RestDaoError>;

/// Failures that can occur while talking to the REST store.
#[derive(Debug, Error)]
pub enum RestDaoError {
    /// Required environment variable is missing.
    #[error("missing REST store environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build REST store client")]
    ClientBuilder {
        /// Underlying builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// A request against a table could not be sent.
    #[error("failed to send REST store request to `{table}`")]
    RequestSend {
        /// Target table.
        table: &'static str,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The store returned an unexpected status code.
    #[error("unexpected REST store response status {status} for `{table}`")]
    RequestStatus {
        /// Target table.
        table: &'static str,
        /// Returned status.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected rows.
    #[error("failed to decode REST store response for `{table}`")]
    DecodeResponse {
        /// Target table.
        table: &'static str,
        /// Decoding failure.
        #[source]
        source: reqwest::Error,
    },
    /// A row carried a timestamp the panel cannot parse.
    #[error("invalid timestamp `{value}` in `{table}` row")]
    InvalidTimestamp {
        /// Target table.
        table: &'static str,
        /// Offending raw value.
        value: String,
        /// Parse failure.
        #[source]
        source: time::error::Parse,
    },
}

impl From<RestDaoError> for StorageError {
    fn from(err: RestDaoError) -> Self {
        let message = err.to_string();
        StorageError::unavailable(message, err)
    }
}
