//! Narrated slideshow pipeline.
//!
//! This crate provides:
//! - Row loading and image lookup
//! - Concurrent per-row jobs with shared credential rotation
//! - Validation, ordered concatenation and export
//! - A scratch workspace removed on every exit path
//! - Progress events, structured logging and metrics

pub mod config;
pub mod error;
pub mod inputs;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod scheduler;
pub mod workspace;

pub use config::WorkerConfig;
pub use error::{RowError, WorkerError, WorkerResult};
pub use inputs::{check_image_folder, load_rows, parse_rows, resolve_image, IMAGE_EXTENSIONS};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::{Pipeline, PipelineServices, RunOutcome, RunReport, RunRequest};
pub use progress::{ProgressChannel, ProgressReceiver};
pub use scheduler::{RowJobScheduler, RowServices};
pub use workspace::Workspace;
