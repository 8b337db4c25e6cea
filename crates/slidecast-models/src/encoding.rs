//! Segment encoding configuration.

use serde::{Deserialize, Serialize};

/// Output canvas width in pixels
pub const CANVAS_WIDTH: u32 = 1920;
/// Output canvas height in pixels
pub const CANVAS_HEIGHT: u32 = 1080;
/// Fixed output frame rate
pub const FRAME_RATE: u32 = 30;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// 8-bit 4:2:0, the widest-supported pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (libx264's own default)
pub const DEFAULT_CRF: u8 = 23;
/// JPEG quality of the normalized intermediate still
pub const STILL_JPEG_QUALITY: u8 = 90;

/// Encoding parameters for one rendered segment.
///
/// Audio is never re-encoded: the synthesized stream is copied into the
/// segment as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEncoding {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}

impl Default for SegmentEncoding {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl SegmentEncoding {
    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-c:a".to_string(),
            "copy".to_string(),
        ];

        args.extend(self.extra_args.clone());

        args
    }
}
