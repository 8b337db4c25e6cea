//! Progress and log events emitted by the pipeline.
//!
//! The pipeline only produces these; a presentation layer (the CLI)
//! consumes them at its own pace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// Human-readable log line
    Log {
        level: LogLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// One row finished, successfully or not
    RowCompleted {
        #[serde(rename = "rowIndex")]
        row_index: usize,
        success: bool,
        /// Progress units done so far (rows + final concatenation)
        completed: usize,
        /// Total progress units for the run
        total: usize,
    },

    /// Final concatenation step finished, joined or not
    Concatenated {
        segments: usize,
        success: bool,
        completed: usize,
        total: usize,
    },

    /// Run finished with an exported file
    Done { output: PathBuf },

    /// Run-level failure
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl RunEvent {
    /// Create an info log event.
    pub fn log(message: impl Into<String>) -> Self {
        Self::log_with_level(LogLevel::Info, message)
    }

    /// Create a log event with an explicit level.
    pub fn log_with_level(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn row_completed(row_index: usize, success: bool, completed: usize, total: usize) -> Self {
        Self::RowCompleted {
            row_index,
            success,
            completed,
            total,
        }
    }

    pub fn concatenated(segments: usize, success: bool, completed: usize, total: usize) -> Self {
        Self::Concatenated {
            segments,
            success,
            completed,
            total,
        }
    }

    pub fn done(output: impl Into<PathBuf>) -> Self {
        Self::Done {
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Progress fraction in [0, 1] for progress-bearing events.
    pub fn progress_fraction(&self) -> Option<f64> {
        match self {
            RunEvent::RowCompleted {
                completed, total, ..
            }
            | RunEvent::Concatenated {
                completed, total, ..
            } if *total > 0 => Some((*completed as f64 / *total as f64).min(1.0)),
            _ => None,
        }
    }
}
