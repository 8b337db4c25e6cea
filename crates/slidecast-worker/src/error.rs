//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

use slidecast_media::MediaError;
use slidecast_models::ModelError;
use slidecast_tts::TtsError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Run-level errors. Everything here aborts a run before any row starts,
/// except `Cancelled`.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No rows to process")]
    EmptyRows,

    #[error("Rows must be a JSON array of objects: {0}")]
    InvalidRowSource(String),

    #[error("No credentials provided")]
    NoCredentials,

    #[error("Image folder not usable: {}", .0.display())]
    ImageFolder(PathBuf),

    #[error("No voice id configured (set ELEVENLABS_VOICE_ID or pass --voice-id)")]
    MissingVoiceId,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Speech synthesis error: {0}")]
    Tts(#[from] TtsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_row_source(msg: impl Into<String>) -> Self {
        Self::InvalidRowSource(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
    }
}

/// Why a single row produced no segment. Never aborts the run.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("image '{0}' not found (.jpg, .jpeg, .png)")]
    MissingImage(String),

    #[error("cancelled")]
    Cancelled,

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] TtsError),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("could not write audio: {0}")]
    Io(#[from] std::io::Error),
}

impl RowError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RowError::MissingImage(_) => "missing_image",
            RowError::Cancelled => "cancelled",
            RowError::Synthesis(e) if e.is_exhausted() => "credentials_exhausted",
            RowError::Synthesis(_) => "synthesis",
            RowError::Media(MediaError::Cancelled) => "cancelled",
            RowError::Media(_) => "media",
            RowError::Io(_) => "io",
        }
    }

    /// Message including encoder diagnostics when there are any.
    pub fn detailed(&self) -> String {
        match self {
            RowError::Media(e) => e.detailed(),
            other => other.to_string(),
        }
    }
}
