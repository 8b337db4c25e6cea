//! Speech synthesis error types.

use thiserror::Error;

/// Result type for synthesis operations.
pub type TtsResult<T> = Result<T, TtsError>;

/// Errors that can occur while talking to the synthesis backend.
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential rejected ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Backend returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("All credentials exhausted after {attempts} attempt(s)")]
    Exhausted {
        attempts: usize,
        /// Last backend failure seen before exhaustion, for logging
        last_error: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TtsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classify a non-2xx response.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Unauthorized { status, body },
            429 => Self::RateLimited(body),
            _ => Self::Http { status, body },
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether moving to another credential could help.
    ///
    /// Configuration problems fail the same way for every key.
    pub fn is_credential_failure(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Exhausted { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
