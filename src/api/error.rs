//! Errors returned by the health API client.

use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected locally before any request was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("cannot connect to health API at {0}")]
    Connect(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx response. `message` is the server's `error` field when present.
    #[error("health API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// True for 401/403 responses.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Status { status: 401 | 403, .. })
    }
}
