//! Error types for the intake pipeline.
//!
//! Errors are classified by where they are allowed to surface:
//! - Storage failures are the only hard errors; they propagate to the caller.
//! - Provider failures (generation, messaging) are absorbed into fallback
//!   text or an abort-without-commit before they cross the pipeline boundary.
//! - Malformed payloads and unknown/already-handled tokens are not errors at
//!   all; they degrade to empty summary fields or idempotent no-ops.

use thiserror::Error;

/// Hard errors that may surface from pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Db(#[from] crate::db::DbError),

    #[error("intake {0} not found")]
    IntakeNotFound(i64),
}

impl PipelineError {
    /// True when the failure comes from the storage layer rather than a
    /// missing record. Useful for mapping to a 5xx vs 404 at the boundary.
    pub fn is_storage(&self) -> bool {
        matches!(self, PipelineError::Db(_))
    }
}

/// Failures from the external generation and messaging capabilities.
///
/// These never escape the pipeline: the narrative layer maps them to
/// fallback text, the notify layer maps them to abort-without-commit.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("provider credential not configured")]
    MissingCredential,

    #[error("provider returned no usable text")]
    EmptyResponse,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        let err = PipelineError::IntakeNotFound(42);
        assert!(!err.is_storage());

        let err = PipelineError::Db(crate::db::DbError::Sqlite(
            rusqlite::Error::InvalidQuery,
        ));
        assert!(err.is_storage());
    }
}
