//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid voice settings: {0}")]
    InvalidVoiceSettings(String),

    #[error("Row {row}: missing required column '{column}'")]
    MissingColumn { row: usize, column: String },
}

impl ModelError {
    pub fn missing_column(row: usize, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            row,
            column: column.into(),
        }
    }
}
