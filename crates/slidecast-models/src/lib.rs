//! Shared data models for the SlideCast pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Voice settings applied to every synthesis call
//! - Row records and per-row task state
//! - Segment results and the row-indexed run result
//! - Segment encoding parameters
//! - Progress/log events emitted by the pipeline

pub mod encoding;
pub mod error;
pub mod event;
pub mod row;
pub mod run;
pub mod segment;
pub mod utils;
pub mod voice;

// Re-export common types
pub use encoding::{SegmentEncoding, CANVAS_HEIGHT, CANVAS_WIDTH, FRAME_RATE};
pub use error::{ModelError, ModelResult};
pub use event::{LogLevel, RunEvent};
pub use row::{RowRecord, RowStatus, RowTask, COLUMN_IMAGE_NAME, COLUMN_TEXT};
pub use run::RunId;
pub use segment::{RunResult, SegmentResult};
pub use utils::{export_file_name, sanitize_file_stem};
pub use voice::VoiceSettings;
