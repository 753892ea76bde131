//! Error taxonomy for release verification.
//!
//! Per-call provider failures are [`ProviderError`]s and are turned into
//! findings by the runner. Only [`VerifyError`] aborts a run.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The external system itself cannot be reached.
    #[error("{system} is unavailable: {detail}")]
    Unavailable { system: String, detail: String },

    /// The requested repository, branch, job or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The call did not complete within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with data that could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// Result alias for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Fatal errors that abort a run before any report is written.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A required external system is unreachable as a whole.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Configuration or manifest input cannot support a verification run.
    #[error("configuration incomplete: {0}")]
    ConfigurationIncomplete(String),

    /// Report artifacts could not be written.
    #[error("report emission failed: {0}")]
    Report(String),
}

/// Result alias for verification runs.
pub type VerifyResult<T> = std::result::Result<T, VerifyError>;
