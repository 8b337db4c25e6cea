//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// One snapshot of FFmpeg's `-progress pipe:2` key/value output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    pub fps: f64,
    /// Encoded output time in microseconds
    pub out_time_us: i64,
    /// Encoding speed relative to realtime
    pub speed: f64,
    /// Set once FFmpeg reports `progress=end`
    pub is_complete: bool,
}

impl FfmpegProgress {
    pub fn encoded_secs(&self) -> f64 {
        self.out_time_us.max(0) as f64 / 1_000_000.0
    }

    /// Share of a segment of `duration` seconds already encoded, in [0, 1].
    pub fn fraction_of(&self, duration: f64) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        if duration <= 0.0 {
            return 0.0;
        }
        (self.encoded_secs() / duration).clamp(0.0, 1.0)
    }

    /// Seconds left for a segment of `duration` seconds at the current speed.
    pub fn eta_secs(&self, duration: f64) -> Option<f64> {
        if self.speed <= 0.0 || self.out_time_us <= 0 {
            return None;
        }
        Some((duration - self.encoded_secs()).max(0.0) / self.speed)
    }
}
