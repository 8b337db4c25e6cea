//! Input rows and per-row task state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ModelError, ModelResult};
use crate::utils::sanitize_file_stem;

/// Column holding the image base name.
pub const COLUMN_IMAGE_NAME: &str = "image name";
/// Column holding the narration text.
pub const COLUMN_TEXT: &str = "text to voice";

/// One record handed over by the row source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    #[serde(rename = "image name")]
    pub image_name: String,
    #[serde(rename = "text to voice")]
    pub text: String,
}

impl RowRecord {
    /// Create a record, trimming both fields.
    pub fn new(image_name: impl AsRef<str>, text: impl AsRef<str>) -> Self {
        Self {
            image_name: image_name.as_ref().trim().to_string(),
            text: text.as_ref().trim().to_string(),
        }
    }

    /// Build a record from a loosely-typed JSON object (one spreadsheet row).
    ///
    /// Non-string cells are stringified, like a spreadsheet cell read as text.
    /// An empty cell is kept; the row simply finds no image later.
    pub fn from_json_object(
        index: usize,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> ModelResult<Self> {
        let image_name = cell_text(index, object, COLUMN_IMAGE_NAME)?;
        let text = cell_text(index, object, COLUMN_TEXT)?;
        Ok(Self::new(image_name, text))
    }
}

fn cell_text(
    row: usize,
    object: &serde_json::Map<String, serde_json::Value>,
    column: &str,
) -> ModelResult<String> {
    match object.get(column) {
        None => Err(ModelError::missing_column(row, column)),
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Null) => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
    }
}

/// Lifecycle of a single row job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RowStatus {
    #[default]
    Pending,
    AudioReady,
    VideoReady,
    Failed(String),
}

impl RowStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RowStatus::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            RowStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Pending => write!(f, "pending"),
            RowStatus::AudioReady => write!(f, "audio_ready"),
            RowStatus::VideoReady => write!(f, "video_ready"),
            RowStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-row job state. Owned and mutated only by the job processing the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowTask {
    /// 0-based input position; defines the final ordering
    pub index: usize,
    pub image_name: String,
    pub text: String,
    /// Resolved image file, set once the image lookup succeeds
    pub image_path: Option<PathBuf>,
    pub audio_path: PathBuf,
    pub video_path: PathBuf,
    pub status: RowStatus,
}

impl RowTask {
    /// Create a pending task whose derived files live under `scratch_dir`.
    ///
    /// File names embed the row index so rows sharing an image name never
    /// collide.
    pub fn new(index: usize, record: &RowRecord, scratch_dir: &Path) -> Self {
        let stem = format!("row-{:04}-{}", index, sanitize_file_stem(&record.image_name));
        Self {
            index,
            image_name: record.image_name.clone(),
            text: record.text.clone(),
            image_path: None,
            audio_path: scratch_dir.join(format!("{}.mp3", stem)),
            video_path: scratch_dir.join(format!("{}.mp4", stem)),
            status: RowStatus::Pending,
        }
    }

    pub fn mark_audio_ready(&mut self) {
        self.status = RowStatus::AudioReady;
    }

    pub fn mark_video_ready(&mut self) {
        self.status = RowStatus::VideoReady;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RowStatus::Failed(reason.into());
    }
}
