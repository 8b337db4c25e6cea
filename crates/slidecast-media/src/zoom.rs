//! Zoom-pan curve for still-image segments.
//!
//! The zoom grows linearly per output frame and saturates at
//! [`MAX_ZOOM`]. Short segments zoom faster so that they still move
//! visibly; the per-frame rate never exceeds [`MAX_ZOOM_SPEED`].

use slidecast_models::{CANVAS_HEIGHT, CANVAS_WIDTH, FRAME_RATE};

/// Upper bound of the zoom factor.
pub const MAX_ZOOM: f64 = 2.0;

/// Upper bound of the per-frame zoom increment.
pub const MAX_ZOOM_SPEED: f64 = 0.01;

/// Total zoom budget spread over a segment of at least one second.
const ZOOM_BUDGET: f64 = 0.1;

/// Zoom parameters for one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCurve {
    speed: f64,
    total_frames: u64,
}

impl ZoomCurve {
    /// Curve for a segment of `duration` seconds.
    ///
    /// Negative or non-finite durations are treated as zero.
    pub fn for_duration(duration: f64) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };

        let speed = MAX_ZOOM_SPEED.min(ZOOM_BUDGET / duration.max(1.0));
        let total_frames = (duration * FRAME_RATE as f64).floor() as u64;

        Self {
            speed,
            total_frames,
        }
    }

    /// Per-frame zoom increment.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Number of output frames at [`FRAME_RATE`].
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Zoom factor at `frame`, in `[1.0, MAX_ZOOM]`.
    pub fn zoom_at(&self, frame: u64) -> f64 {
        (1.0 + frame as f64 * self.speed).min(MAX_ZOOM)
    }

    /// Zoom reached on the last frame.
    pub fn final_zoom(&self) -> f64 {
        self.zoom_at(self.total_frames.saturating_sub(1))
    }

    /// `zoompan` filter expression, centred on the image.
    pub fn filter(&self) -> String {
        format!(
            "zoompan=z='if(gte(zoom,{max:.1}),{max:.1},zoom+{speed})':\
             x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':\
             d=1:s={w}x{h}:fps={fps}",
            max = MAX_ZOOM,
            speed = self.speed,
            w = CANVAS_WIDTH,
            h = CANVAS_HEIGHT,
            fps = FRAME_RATE,
        )
    }
}
