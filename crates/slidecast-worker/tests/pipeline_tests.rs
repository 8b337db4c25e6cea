//! End-to-end run scenarios against in-process fakes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

use slidecast_media::{
    MediaError, MediaInfo, MediaProber, MediaResult, SegmentConcatenator, SegmentRenderer,
};
use slidecast_models::{RowRecord, RowStatus, RunEvent, VoiceSettings};
use slidecast_tts::{Credential, SpeechSynthesizer, TtsError, TtsResult};
use slidecast_worker::{
    Pipeline, PipelineServices, ProgressChannel, RowServices, RunOutcome, RunRequest,
    WorkerConfig, WorkerError,
};

/// Fails for listed keys; sleeps before answering texts starting with "slow".
#[derive(Default)]
struct FakeSynth {
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeSynth {
    fn failing(keys: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: keys.iter().map(|k| k.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(
        &self,
        text: &str,
        credential: &Credential,
        _settings: &VoiceSettings,
    ) -> TtsResult<Vec<u8>> {
        self.calls.lock().unwrap().push(text.to_string());
        if text.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(80)).await;
        }
        if self.failing.iter().any(|k| k == credential.expose()) {
            return Err(TtsError::from_http_status(401, "invalid api key"));
        }
        Ok(text.as_bytes().to_vec())
    }
}

/// Segments probe fine unless their file name contains `reject`.
struct FakeProber {
    reject: Option<String>,
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn audio_duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(3.0)
    }

    async fn probe_segment(&self, path: &Path) -> MediaResult<MediaInfo> {
        let name = path.to_string_lossy();
        if let Some(reject) = &self.reject {
            if name.contains(reject.as_str()) {
                return Err(MediaError::invalid_media("no video stream"));
            }
        }
        Ok(MediaInfo {
            duration: Some(3.0),
            has_video: true,
            has_audio: true,
            width: 1920,
            height: 1080,
            fps: Some(30.0),
            size: 0,
        })
    }
}

struct FakeRenderer;

#[async_trait]
impl SegmentRenderer for FakeRenderer {
    async fn render(
        &self,
        _image: &Path,
        audio: &Path,
        output: &Path,
        _duration: f64,
    ) -> MediaResult<PathBuf> {
        tokio::fs::copy(audio, output).await?;
        Ok(output.to_path_buf())
    }
}

#[derive(Default)]
struct FakeConcat {
    fail: bool,
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl FakeConcat {
    fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SegmentConcatenator for FakeConcat {
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> MediaResult<PathBuf> {
        self.calls.lock().unwrap().push(segments.to_vec());
        if self.fail {
            return Err(MediaError::ffmpeg_failed(
                "concat failed",
                Some("bad stream".into()),
                Some(1),
            ));
        }
        let mut joined = Vec::new();
        for segment in segments {
            joined.extend(tokio::fs::read(segment).await?);
        }
        tokio::fs::write(output, joined).await?;
        Ok(output.to_path_buf())
    }
}

struct Harness {
    images: TempDir,
    work: TempDir,
    export: TempDir,
    synth: Arc<FakeSynth>,
    concat: Arc<FakeConcat>,
    reject: Option<String>,
}

impl Harness {
    fn new(image_files: &[&str], synth: Arc<FakeSynth>) -> Self {
        let images = TempDir::new().unwrap();
        for name in image_files {
            std::fs::write(images.path().join(name), b"image").unwrap();
        }
        Self {
            images,
            work: TempDir::new().unwrap(),
            export: TempDir::new().unwrap(),
            synth,
            concat: Arc::new(FakeConcat::default()),
            reject: None,
        }
    }

    fn failing_concat(mut self) -> Self {
        self.concat = Arc::new(FakeConcat {
            fail: true,
            calls: Mutex::new(Vec::new()),
        });
        self
    }

    fn rejecting(mut self, fragment: &str) -> Self {
        self.reject = Some(fragment.to_string());
        self
    }

    fn pipeline(&self) -> Pipeline {
        let config = WorkerConfig {
            work_dir: self.work.path().to_string_lossy().into_owned(),
            ..WorkerConfig::default()
        };
        let services = PipelineServices {
            rows: RowServices {
                synthesizer: self.synth.clone(),
                prober: Arc::new(FakeProber {
                    reject: self.reject.clone(),
                }),
                renderer: Arc::new(FakeRenderer),
            },
            concatenator: self.concat.clone(),
        };
        Pipeline::new(config, services)
    }

    fn request(&self, rows: &[(&str, &str)], keys: &[&str]) -> RunRequest {
        RunRequest {
            rows: rows.iter().map(|(i, t)| RowRecord::new(i, t)).collect(),
            image_dir: self.images.path().to_path_buf(),
            export_dir: Some(self.export.path().to_path_buf()),
            credentials: keys.iter().filter_map(|k| Credential::new(k)).collect(),
            settings: VoiceSettings::default(),
        }
    }

    fn workspace_entries(&self) -> usize {
        std::fs::read_dir(self.work.path()).unwrap().count()
    }

    fn export_entries(&self) -> Vec<String> {
        std::fs::read_dir(self.export.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

fn is_export_name(name: &str) -> bool {
    name.len() == "Export-".len() + 6 + ".mp4".len()
        && name.starts_with("Export-")
        && name.ends_with(".mp4")
        && name["Export-".len()..name.len() - 4]
            .chars()
            .all(|c| c.is_ascii_hexdigit())
}

#[tokio::test]
async fn test_three_rows_one_credential_exports() {
    let harness = Harness::new(&["a.jpg", "b.png", "c.jpeg"], FakeSynth::failing(&[]));

    let report = harness
        .pipeline()
        .run(harness.request(&[("a", "one"), ("b", "two"), ("c", "three")], &["key_a"]))
        .await
        .unwrap();

    let RunOutcome::Exported(path) = &report.outcome else {
        panic!("expected export, got {:?}", report.outcome);
    };
    assert_eq!(path.parent().unwrap(), harness.export.path());
    assert!(path.exists());
    assert_eq!(std::fs::read(path).unwrap(), b"onetwothree");
    assert_eq!(report.result.output.as_ref(), Some(path));

    let exports = harness.export_entries();
    assert_eq!(exports.len(), 1);
    assert!(is_export_name(&exports[0]), "bad export name {}", exports[0]);

    assert_eq!(harness.concat.calls().len(), 1);
    assert_eq!(harness.concat.calls()[0].len(), 3);
    assert_eq!(report.failed_rows(), 0);
    assert_eq!(harness.workspace_entries(), 0);
}

#[tokio::test]
async fn test_concat_order_follows_rows_not_completion() {
    let harness = Harness::new(&["a.jpg", "b.jpg", "c.jpg"], FakeSynth::failing(&[]));

    let report = harness
        .pipeline()
        .run(harness.request(
            &[("a", "slow first"), ("b", "second"), ("c", "third")],
            &["key_a"],
        ))
        .await
        .unwrap();

    let segments = &harness.concat.calls()[0];
    let names: Vec<String> = segments
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["row-0000-a.mp4", "row-0001-b.mp4", "row-0002-c.mp4"]);

    let RunOutcome::Exported(path) = &report.outcome else {
        panic!("expected export");
    };
    assert_eq!(std::fs::read(path).unwrap(), b"slow firstsecondthird");
}

#[tokio::test]
async fn test_missing_image_row_is_skipped() {
    let harness = Harness::new(&["a.jpg"], FakeSynth::failing(&[]));

    let report = harness
        .pipeline()
        .run(harness.request(&[("a", "kept"), ("ghost", "never sent")], &["key_a"]))
        .await
        .unwrap();

    assert_eq!(harness.synth.texts(), vec!["kept".to_string()]);
    assert!(report.tasks[1].status.is_failed());
    assert_eq!(report.tasks[0].status, RowStatus::VideoReady);
    assert!(matches!(report.outcome, RunOutcome::Exported(_)));
}

#[tokio::test]
async fn test_all_credentials_failing_produces_no_video() {
    let harness = Harness::new(&["a.jpg", "b.jpg"], FakeSynth::failing(&["key_a", "key_b"]));

    let report = harness
        .pipeline()
        .run(harness.request(&[("a", "one"), ("b", "two")], &["key_a", "key_b"]))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::NoVideo);
    assert_eq!(report.failed_rows(), 2);
    assert_eq!(report.result.completed_count(), 0);
    assert!(harness.concat.calls().is_empty());
    assert!(harness.export_entries().is_empty());
    assert_eq!(harness.workspace_entries(), 0);
}

#[tokio::test]
async fn test_failed_join_keeps_workspace() {
    let harness = Harness::new(&["a.jpg", "b.jpg"], FakeSynth::failing(&[])).failing_concat();

    let report = harness
        .pipeline()
        .run(harness.request(&[("a", "one"), ("b", "two")], &["key_a"]))
        .await
        .unwrap();

    let RunOutcome::ConcatFailed { reason, workspace } = &report.outcome else {
        panic!("expected concat failure, got {:?}", report.outcome);
    };
    assert!(reason.contains("concat failed"));
    assert!(workspace.join("row-0000-a.mp4").exists());
    assert!(workspace.join("row-0001-b.mp4").exists());
    assert!(harness.export_entries().is_empty());
}

#[tokio::test]
async fn test_failed_join_still_completes_progress() {
    let harness = Harness::new(&["a.jpg", "b.jpg"], FakeSynth::failing(&[])).failing_concat();
    let (progress, mut events) = ProgressChannel::new();

    let report = harness
        .pipeline()
        .with_progress(progress)
        .run(harness.request(&[("a", "one"), ("b", "two")], &["key_a"]))
        .await
        .unwrap();
    assert!(matches!(report.outcome, RunOutcome::ConcatFailed { .. }));

    let mut last_fraction = None;
    let mut join_success = None;
    while let Ok(event) = events.try_recv() {
        if let Some(fraction) = event.progress_fraction() {
            last_fraction = Some(fraction);
        }
        if let RunEvent::Concatenated { success, .. } = event {
            join_success = Some(success);
        }
    }
    assert_eq!(join_success, Some(false));
    assert_eq!(last_fraction, Some(1.0));
}

#[tokio::test]
async fn test_without_export_dir_segments_are_retained() {
    let harness = Harness::new(&["a.jpg"], FakeSynth::failing(&[]));
    let mut request = harness.request(&[("a", "one")], &["key_a"]);
    request.export_dir = None;

    let report = harness.pipeline().run(request).await.unwrap();

    let RunOutcome::NoExportDir { workspace } = &report.outcome else {
        panic!("expected retained workspace");
    };
    assert!(workspace.join("row-0000-a.mp4").exists());
    assert!(harness.concat.calls().is_empty());
}

#[tokio::test]
async fn test_dropped_segment_is_excluded() {
    let harness =
        Harness::new(&["a.jpg", "b.jpg", "c.jpg"], FakeSynth::failing(&[])).rejecting("row-0001");

    let report = harness
        .pipeline()
        .run(harness.request(&[("a", "one"), ("b", "two"), ("c", "three")], &["key_a"]))
        .await
        .unwrap();

    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].row_index, 1);
    assert_eq!(harness.concat.calls()[0].len(), 2);
    let RunOutcome::Exported(path) = &report.outcome else {
        panic!("expected export");
    };
    assert_eq!(std::fs::read(path).unwrap(), b"onethree");
}

#[tokio::test]
async fn test_setup_errors_abort_before_any_row() {
    let harness = Harness::new(&["a.jpg"], FakeSynth::failing(&[]));
    let pipeline = harness.pipeline();

    let err = pipeline
        .run(harness.request(&[], &["key_a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::EmptyRows));

    let err = pipeline
        .run(harness.request(&[("a", "one")], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::NoCredentials));

    let mut request = harness.request(&[("a", "one")], &["key_a"]);
    request.image_dir = harness.images.path().join("missing");
    let err = pipeline.run(request).await.unwrap_err();
    assert!(matches!(err, WorkerError::ImageFolder(_)));

    assert!(harness.synth.texts().is_empty());
    assert_eq!(harness.workspace_entries(), 0);
}

#[tokio::test]
async fn test_cancelled_run_removes_workspace() {
    let harness = Harness::new(&["a.jpg"], FakeSynth::failing(&[]));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let err = harness
        .pipeline()
        .with_cancel(cancel_rx)
        .run(harness.request(&[("a", "one")], &["key_a"]))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(harness.synth.texts().is_empty());
    assert_eq!(harness.workspace_entries(), 0);
    assert!(harness.export_entries().is_empty());
}
