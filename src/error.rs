//! Error types for balance_tui
//!
//! Fetch and parse failures are contained at the poller boundary; the
//! rendering side only ever sees well-formed data.

use thiserror::Error;

/// Failures talking to the balance-checker backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: missing {0}")]
    MalformedPayload(&'static str),
}

impl ApiError {
    /// Malformed aggregate payloads skip only the aggregate update for the
    /// cycle; other failures are treated as transient network errors.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ApiError::MalformedPayload(_))
    }
}
