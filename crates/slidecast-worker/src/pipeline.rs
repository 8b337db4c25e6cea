//! Run entry point.
//!
//! A run checks its setup inputs, creates a scratch workspace, hands the
//! rows to the [`RowJobScheduler`], validates what came back and joins the
//! surviving segments in row order. The export is written inside the
//! workspace and only then moved into the export directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

use slidecast_media::{
    move_file, DroppedSegment, FfmpegConcatenator, FfmpegSegmentRenderer, FfprobeProber,
    MediaError, SegmentConcatenator, SegmentValidator,
};
use slidecast_models::{export_file_name, RowRecord, RowTask, RunId, RunResult, VoiceSettings};
use slidecast_tts::{Credential, CredentialRotator, SpeechSynthesizer};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::inputs::check_image_folder;
use crate::logging::RunLogger;
use crate::progress::ProgressChannel;
use crate::scheduler::{RowJobScheduler, RowServices};
use crate::workspace::Workspace;

/// Everything a run needs from the presentation layer.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub rows: Vec<RowRecord>,
    pub image_dir: PathBuf,
    /// Where the export lands; `None` keeps the rendered segments instead
    pub export_dir: Option<PathBuf>,
    pub credentials: Vec<Credential>,
    pub settings: VoiceSettings,
}

/// How a run ended once every row had been attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Final file moved into the export directory
    Exported(PathBuf),
    /// No segment survived validation; nothing was written
    NoVideo,
    /// Rendering finished but there was nowhere to export to
    NoExportDir { workspace: PathBuf },
    /// The join or the move failed; segments are left in `workspace`
    ConcatFailed { reason: String, workspace: PathBuf },
}

impl RunOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Exported(_) => "exported",
            RunOutcome::NoVideo => "no_video",
            RunOutcome::NoExportDir { .. } => "no_export_dir",
            RunOutcome::ConcatFailed { .. } => "concat_failed",
        }
    }
}

/// Final state of a run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    /// Per-row statuses in row order
    pub tasks: Vec<RowTask>,
    pub result: RunResult,
    pub dropped: Vec<DroppedSegment>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn failed_rows(&self) -> usize {
        self.tasks.iter().filter(|t| t.status.is_failed()).count()
    }
}

/// Collaborators for a run. Row services plus the final joiner.
#[derive(Clone)]
pub struct PipelineServices {
    pub rows: RowServices,
    pub concatenator: Arc<dyn SegmentConcatenator>,
}

impl PipelineServices {
    /// FFmpeg/ffprobe-backed services sized and timed from `config`.
    pub fn ffmpeg(
        config: &WorkerConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        let renderer = FfmpegSegmentRenderer::new(config.max_ffmpeg_processes)
            .with_timeout(config.render_timeout.as_secs())
            .with_cancel(cancel_rx.clone());
        let concatenator = FfmpegConcatenator::new()
            .with_timeout(config.concat_timeout.as_secs())
            .with_cancel(cancel_rx);

        Self {
            rows: RowServices {
                synthesizer,
                prober: Arc::new(FfprobeProber::new().with_timeout(config.probe_timeout)),
                renderer: Arc::new(renderer),
            },
            concatenator: Arc::new(concatenator),
        }
    }
}

pub struct Pipeline {
    config: WorkerConfig,
    services: PipelineServices,
    progress: ProgressChannel,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Pipeline {
    pub fn new(config: WorkerConfig, services: PipelineServices) -> Self {
        Self {
            config,
            services,
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

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Check the inputs that abort a run before any row is dispatched.
    async fn check_setup(&self, request: &RunRequest) -> WorkerResult<()> {
        if request.rows.is_empty() {
            return Err(WorkerError::EmptyRows);
        }
        if request.credentials.is_empty() {
            return Err(WorkerError::NoCredentials);
        }
        check_image_folder(&request.image_dir).await
    }

    /// Execute one run.
    ///
    /// Row failures never make this return `Err`; they show up in the
    /// report. `Err` means a setup error or cancellation.
    pub async fn run(&self, request: RunRequest) -> WorkerResult<RunReport> {
        self.check_setup(&request).await?;

        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "slideshow");
        let span = logger.create_span();
        self.execute(request, run_id, logger).instrument(span).await
    }

    async fn execute(
        &self,
        request: RunRequest,
        run_id: RunId,
        logger: RunLogger,
    ) -> WorkerResult<RunReport> {
        logger.log_start(&format!(
            "{} rows, {} credentials",
            request.rows.len(),
            request.credentials.len()
        ));

        let workspace = Workspace::create(&self.config.work_dir, &run_id).await?;

        let tasks: Vec<RowTask> = request
            .rows
            .iter()
            .enumerate()
            .map(|(index, record)| RowTask::new(index, record, workspace.path()))
            .collect();

        // One unit per row plus one for the join
        self.progress.start(tasks.len() + 1);
        self.progress.log(format!("Processing {} rows", tasks.len()));

        let rotator = Arc::new(CredentialRotator::new(request.credentials));
        let mut scheduler = RowJobScheduler::new(
            self.services.rows.clone(),
            Arc::clone(&rotator),
            &request.image_dir,
            self.config.max_concurrent_rows,
        )
        .with_progress(self.progress.clone());
        if let Some(rx) = &self.cancel_rx {
            scheduler = scheduler.with_cancel(rx.clone());
        }

        let (tasks, mut result) = scheduler.run(tasks, &request.settings).await;

        if self.is_cancelled() {
            logger.log_warning("cancelled after row processing");
            crate::metrics::record_run("cancelled");
            return Err(WorkerError::Cancelled);
        }

        logger.log_progress(&format!(
            "{}/{} rows rendered, credential cursor at {}",
            result.completed_count(),
            tasks.len(),
            rotator.cursor()
        ));

        let validator = SegmentValidator::new(Arc::clone(&self.services.rows.prober));
        let validation = validator.validate(&mut result).await;
        if !validation.dropped.is_empty() {
            crate::metrics::record_dropped_segments(validation.dropped.len());
            for dropped in &validation.dropped {
                self.progress.warn(format!(
                    "Row {}: segment dropped: {}",
                    dropped.row_index + 1,
                    dropped.reason
                ));
            }
        }

        let segments: Vec<PathBuf> = result
            .valid_segments()
            .into_iter()
            .map(|s| s.path.clone())
            .collect();

        let outcome = if segments.is_empty() {
            logger.log_warning("no valid segments, nothing to export");
            self.progress.error("No video was produced");
            RunOutcome::NoVideo
        } else if let Some(export_dir) = &request.export_dir {
            match self
                .export(&segments, &workspace, export_dir, &mut result)
                .await
            {
                Ok(path) => RunOutcome::Exported(path),
                Err(MediaError::Cancelled) => {
                    crate::metrics::record_run("cancelled");
                    return Err(WorkerError::Cancelled);
                }
                Err(e) => {
                    let reason = e.detailed();
                    logger.log_error(&format!("export failed: {}", reason));
                    self.progress.error(format!("Export failed: {}", e));
                    RunOutcome::ConcatFailed {
                        reason,
                        workspace: workspace.keep(),
                    }
                }
            }
        } else {
            let kept = workspace.keep();
            self.progress.warn(format!(
                "No export folder selected; segments left in {}",
                kept.display()
            ));
            RunOutcome::NoExportDir { workspace: kept }
        };

        crate::metrics::record_run(outcome.label());
        logger.log_completion(outcome.label());

        Ok(RunReport {
            run_id,
            tasks,
            result,
            dropped: validation.dropped,
            outcome,
        })
    }

    async fn export(
        &self,
        segments: &[PathBuf],
        workspace: &Workspace,
        export_dir: &Path,
        result: &mut RunResult,
    ) -> Result<PathBuf, MediaError> {
        let file_name = export_file_name();
        let joined = workspace.path().join(&file_name);

        let joined_result = self.services.concatenator.concat(segments, &joined).await;
        if !matches!(joined_result, Err(MediaError::Cancelled)) {
            self.progress
                .concatenated(segments.len(), joined_result.is_ok());
        }
        joined_result?;

        let destination = export_dir.join(&file_name);
        move_file(&joined, &destination).await?;

        result.output = Some(destination.clone());
        self.progress.done(&destination);
        Ok(destination)
    }
}
