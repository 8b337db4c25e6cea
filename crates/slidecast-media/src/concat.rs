//! Stream-copy concatenation of rendered segments.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::watch;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ScopedFile;

/// Default timeout for the final join in seconds.
pub const DEFAULT_CONCAT_TIMEOUT_SECS: u64 = 1800;

/// Joins segments, in the given order, into one file.
#[async_trait]
pub trait SegmentConcatenator: Send + Sync {
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> MediaResult<PathBuf>;
}

/// Quote a path for the concat demuxer.
///
/// The demuxer reads single-quoted strings; an embedded quote closes the
/// string, emits an escaped quote and reopens it.
fn quote_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

fn absolute_path(path: &Path) -> MediaResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Render a concat-demuxer list file, one `file '<abs path>'` line per segment.
pub fn build_concat_list(segments: &[PathBuf]) -> MediaResult<String> {
    let mut list = String::new();
    for segment in segments {
        list.push_str("file ");
        list.push_str(&quote_path(&absolute_path(segment)?));
        list.push('\n');
    }
    Ok(list)
}

/// [`SegmentConcatenator`] using FFmpeg's concat demuxer with `-c copy`.
#[derive(Clone)]
pub struct FfmpegConcatenator {
    timeout_secs: u64,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Default for FfmpegConcatenator {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CONCAT_TIMEOUT_SECS,
            cancel_rx: None,
        }
    }
}

impl FfmpegConcatenator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }
}

#[async_trait]
impl SegmentConcatenator for FfmpegConcatenator {
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> MediaResult<PathBuf> {
        if segments.is_empty() {
            return Err(MediaError::invalid_media("No segments to concatenate"));
        }

        let list = ScopedFile::new(output.with_extension("concat.txt"));
        tokio::fs::write(list.path(), build_concat_list(segments)?).await?;

        let cmd = FfmpegCommand::with_output(output)
            .input_with_args(["-f", "concat", "-safe", "0"], list.path())
            .codec_copy();

        let mut runner = FfmpegRunner::new().with_timeout(self.timeout_secs);
        if let Some(rx) = &self.cancel_rx {
            runner = runner.with_cancel(rx.clone());
        }

        let started = Instant::now();
        runner.run(&cmd).await?;

        info!(
            segments = segments.len(),
            output = %output.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Concatenated segments"
        );

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_preserves_order() {
        let segments = vec![
            PathBuf::from("/s/row-0002-c.mp4"),
            PathBuf::from("/s/row-0000-a.mp4"),
        ];
        let list = build_concat_list(&segments).unwrap();
        assert_eq!(
            list,
            "file '/s/row-0002-c.mp4'\nfile '/s/row-0000-a.mp4'\n"
        );
    }

    #[test]
    fn test_single_quote_escaping() {
        let list = build_concat_list(&[PathBuf::from("/s/it's here.mp4")]).unwrap();
        assert_eq!(list, "file '/s/it'\\''s here.mp4'\n");
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let list = build_concat_list(&[PathBuf::from("row-0000-a.mp4")]).unwrap();
        let path = list
            .strip_prefix("file '")
            .and_then(|l| l.strip_suffix("'\n"))
            .unwrap();
        assert!(Path::new(path).is_absolute());
        assert!(path.ends_with("row-0000-a.mp4"));
    }

    #[tokio::test]
    async fn test_no_segments_is_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("joined.mp4");
        let err = FfmpegConcatenator::new()
            .concat(&[], &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidMedia(_)));
        assert!(!output.exists());
        assert!(!dir.path().join("joined.concat.txt").exists());
    }
}
