//! Error types for the Tromero SDK
//!
//! Every expected failure mode surfaces as a `TromeroError` value on both the
//! streaming and non-streaming paths. Malformed stream frames and invalid
//! parameter keys recover locally with warnings and never reach callers.

use thiserror::Error;

/// Errors surfaced to callers of the SDK
#[derive(Debug, Error)]
pub enum TromeroError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TromeroError {
    /// Map a non-2xx HTTP status and body text to the matching variant
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => TromeroError::Authentication(message),
            429 => TromeroError::RateLimit(message),
            400 => TromeroError::BadRequest(message),
            _ => TromeroError::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for TromeroError {
    fn from(err: reqwest::Error) -> Self {
        TromeroError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            TromeroError::from_status(401, "no".into()),
            TromeroError::Authentication(_)
        ));
        assert!(matches!(
            TromeroError::from_status(429, "slow down".into()),
            TromeroError::RateLimit(_)
        ));
        assert!(matches!(
            TromeroError::from_status(400, "bad".into()),
            TromeroError::BadRequest(_)
        ));
        assert!(matches!(
            TromeroError::from_status(503, "down".into()),
            TromeroError::Api { status: 503, .. }
        ));
    }
}
