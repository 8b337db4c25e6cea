//! Still-plus-narration segment rendering.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, trace, warn};

use slidecast_models::{SegmentEncoding, FRAME_RATE};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::still::normalize_still;
use crate::zoom::ZoomCurve;

/// Default per-segment encode timeout in seconds.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 600;

/// Renders one row's image and narration into a video segment.
#[async_trait]
pub trait SegmentRenderer: Send + Sync {
    /// Produce `output` from `image` and `audio`, lasting exactly `duration`
    /// seconds. Returns the segment path.
    async fn render(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<PathBuf>;
}

/// [`SegmentRenderer`] that shells out to `ffmpeg`.
///
/// Encoder processes across all rows share one semaphore; each encode is
/// bounded by a timeout and killed on cancellation.
#[derive(Clone)]
pub struct FfmpegSegmentRenderer {
    encoding: SegmentEncoding,
    ffmpeg_slots: Arc<Semaphore>,
    timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegSegmentRenderer {
    /// Create a renderer allowing `max_ffmpeg` simultaneous encodes.
    pub fn new(max_ffmpeg: usize) -> Self {
        Self::with_slots(Arc::new(Semaphore::new(max_ffmpeg.max(1))))
    }

    /// Create a renderer drawing from an existing encoder semaphore.
    pub fn with_slots(ffmpeg_slots: Arc<Semaphore>) -> Self {
        Self {
            encoding: SegmentEncoding::default(),
            ffmpeg_slots,
            timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            cancel_rx: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        let runner = FfmpegRunner::new().with_timeout(self.timeout_secs);
        match &self.cancel_rx {
            Some(rx) => runner.with_cancel(rx.clone()),
            None => runner,
        }
    }
}

/// Build the encode command for one segment.
pub fn build_segment_command(
    still: &Path,
    audio: &Path,
    output: &Path,
    duration: f64,
    curve: &ZoomCurve,
    encoding: &SegmentEncoding,
) -> FfmpegCommand {
    let limit = format!("{:.3}", duration);

    FfmpegCommand::with_output(output)
        .input_with_args(
            [
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                FRAME_RATE.to_string(),
                "-t".to_string(),
                limit,
            ],
            still,
        )
        .input(audio)
        .filter_complex(format!("[0:v]{}[v]", curve.filter()))
        .map("[v]")
        .map("1:a")
        .output_args(encoding.to_ffmpeg_args())
        .duration(duration)
}

#[async_trait]
impl SegmentRenderer for FfmpegSegmentRenderer {
    async fn render(
        &self,
        image: &Path,
        audio: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<PathBuf> {
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }

        let still = normalize_still(image, &output.with_extension("still.jpg")).await?;

        let curve = ZoomCurve::for_duration(duration);
        debug!(
            output = %output.display(),
            frames = curve.total_frames(),
            speed = curve.speed(),
            final_zoom = curve.final_zoom(),
            "Zoom curve"
        );

        let cmd = build_segment_command(
            still.path(),
            audio,
            output,
            duration,
            &curve,
            &self.encoding,
        );

        let _permit = self
            .ffmpeg_slots
            .acquire()
            .await
            .map_err(|_| MediaError::internal("FFmpeg slots closed"))?;

        let started = Instant::now();
        let label = output.display().to_string();
        let result = self
            .runner()
            .run_with_progress(&cmd, move |p| {
                trace!(
                    output = %label,
                    fraction = p.fraction_of(duration),
                    speed = p.speed,
                    "Encoding"
                );
            })
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        let status = if result.is_ok() { "success" } else { "failure" };
        metrics::histogram!("slidecast_render_duration_seconds", "status" => status)
            .record(elapsed);

        if let Err(e) = result {
            if let Err(rm) = tokio::fs::remove_file(output).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!(output = %output.display(), error = %rm, "Failed to remove partial segment");
                }
            }
            return Err(e);
        }

        info!(
            output = %output.display(),
            duration_secs = duration,
            elapsed_secs = elapsed,
            "Rendered segment"
        );

        Ok(output.to_path_buf())
    }
}
