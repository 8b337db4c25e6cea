//! FFmpeg CLI wrapper for slideshow segments.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - Still normalization, zoom-pan segment rendering and concatenation
//! - FFprobe-based probing and segment validation

pub mod command;
pub mod concat;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod segment;
pub mod still;
pub mod validate;
pub mod zoom;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{build_concat_list, FfmpegConcatenator, SegmentConcatenator};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{move_file, ScopedFile};
pub use probe::{probe_media, FfprobeProber, MediaInfo, MediaProber};
pub use progress::FfmpegProgress;
pub use segment::{FfmpegSegmentRenderer, SegmentRenderer};
pub use still::normalize_still;
pub use validate::{DroppedSegment, SegmentValidator, ValidationReport};
pub use zoom::ZoomCurve;
