//! Concurrent per-row jobs.
//!
//! Every row runs as its own future: image lookup, speech synthesis with
//! credential rotation, duration probe, then segment rendering. All
//! futures are launched together and joined together; a semaphore bounds
//! how many are past their first step at once. Results land in a slot
//! array indexed by row, so completion order never leaks into the output.

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tracing::{info, warn, Instrument};

use slidecast_media::{MediaProber, SegmentRenderer};
use slidecast_models::{RowTask, RunResult, SegmentResult, VoiceSettings};
use slidecast_tts::{synthesize_with_rotation, CredentialRotator, SpeechSynthesizer};

use crate::error::RowError;
use crate::inputs::resolve_image;
use crate::progress::ProgressChannel;

/// External collaborators used by every row job.
#[derive(Clone)]
pub struct RowServices {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub prober: Arc<dyn MediaProber>,
    pub renderer: Arc<dyn SegmentRenderer>,
}

/// Fans rows out to concurrent jobs and fans their segments back in.
pub struct RowJobScheduler {
    services: RowServices,
    rotator: Arc<CredentialRotator>,
    image_dir: PathBuf,
    row_slots: Arc<Semaphore>,
    progress: ProgressChannel,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl RowJobScheduler {
    pub fn new(
        services: RowServices,
        rotator: Arc<CredentialRotator>,
        image_dir: impl Into<PathBuf>,
        max_concurrent_rows: usize,
    ) -> Self {
        Self {
            services,
            rotator,
            image_dir: image_dir.into(),
            row_slots: Arc::new(Semaphore::new(max_concurrent_rows.max(1))),
            progress: ProgressChannel::disabled(),
            cancel_rx: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressChannel) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Process every task. Row failures are recorded on the task and never
    /// stop the other rows.
    pub async fn run(
        &self,
        tasks: Vec<RowTask>,
        settings: &VoiceSettings,
    ) -> (Vec<RowTask>, RunResult) {
        let mut result = RunResult::with_rows(tasks.len());

        let jobs = tasks.into_iter().map(|task| {
            let span = tracing::info_span!("row", row_index = task.index);
            self.run_row(task, settings).instrument(span)
        });
        let finished = join_all(jobs).await;

        let mut tasks = Vec::with_capacity(finished.len());
        for (task, segment) in finished {
            if let Some(segment) = segment {
                result.insert(segment);
            }
            tasks.push(task);
        }

        (tasks, result)
    }

    async fn run_row(
        &self,
        mut task: RowTask,
        settings: &VoiceSettings,
    ) -> (RowTask, Option<SegmentResult>) {
        let started = Instant::now();
        let outcome = self.process_row(&mut task, settings).await;
        let elapsed = started.elapsed().as_secs_f64();
        let row_number = task.index + 1;

        let segment = match outcome {
            Ok(segment) => {
                info!(image = %task.image_name, duration = segment.duration, "Row rendered");
                self.progress.log(format!(
                    "Row {}: rendered '{}' ({:.1}s)",
                    row_number, task.image_name, segment.duration
                ));
                crate::metrics::record_row("success", elapsed);
                Some(segment)
            }
            Err(e) => {
                let reason = e.detailed();
                warn!(image = %task.image_name, error = %reason, "Row failed");
                self.progress.warn(format!(
                    "Row {} ('{}') failed: {}",
                    row_number, task.image_name, e
                ));
                crate::metrics::record_row(e.kind(), elapsed);
                task.fail(reason);
                None
            }
        };

        self.progress.row_completed(task.index, segment.is_some());
        (task, segment)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    async fn process_row(
        &self,
        task: &mut RowTask,
        settings: &VoiceSettings,
    ) -> Result<SegmentResult, RowError> {
        let _permit = self
            .row_slots
            .acquire()
            .await
            .map_err(|_| RowError::Cancelled)?;

        if self.is_cancelled() {
            return Err(RowError::Cancelled);
        }

        let image = resolve_image(&self.image_dir, &task.image_name)
            .await
            .ok_or_else(|| RowError::MissingImage(task.image_name.clone()))?;
        task.image_path = Some(image.clone());

        let synthesis = synthesize_with_rotation(
            self.services.synthesizer.as_ref(),
            &self.rotator,
            &task.text,
            settings,
        )
        .await?;
        tokio::fs::write(&task.audio_path, &synthesis.audio).await?;
        task.mark_audio_ready();

        if self.is_cancelled() {
            return Err(RowError::Cancelled);
        }

        let duration = self.services.prober.audio_duration(&task.audio_path).await?;

        let path = self
            .services
            .renderer
            .render(&image, &task.audio_path, &task.video_path, duration)
            .await?;
        task.mark_video_ready();

        Ok(SegmentResult::new(task.index, path, duration))
    }
}
