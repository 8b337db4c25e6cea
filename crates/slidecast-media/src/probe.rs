//! FFprobe media information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container duration in seconds, when reported
    pub duration: Option<f64>,
    /// Whether at least one video stream is present
    pub has_video: bool,
    /// Whether at least one audio stream is present
    pub has_audio: bool,
    /// Width in pixels (0 without video)
    pub width: u32,
    /// Height in pixels (0 without video)
    pub height: u32,
    /// Video frame rate (fps), when reported
    pub fps: Option<f64>,
    /// File size in bytes
    pub size: u64,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Parse FFprobe's JSON output.
pub fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
    let has_audio = probe.streams.iter().any(|s| s.codec_type == "audio");

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    let size = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let fps = video_stream.and_then(|s| {
        s.avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .or_else(|| s.r_frame_rate.as_deref().and_then(parse_frame_rate))
    });

    Ok(MediaInfo {
        duration,
        has_video: video_stream.is_some(),
        has_audio,
        width: video_stream.and_then(|s| s.width).unwrap_or(0),
        height: video_stream.and_then(|s| s.height).unwrap_or(0),
        fps,
        size,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97"). `0/0` yields `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}

/// Probing seam used by the pipeline.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Duration of a synthesized audio file, in seconds.
    async fn audio_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Structural check of a rendered segment.
    ///
    /// Fails when the file cannot be probed or carries no video stream.
    async fn probe_segment(&self, path: &Path) -> MediaResult<MediaInfo>;
}

/// [`MediaProber`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber {
    timeout: Option<Duration>,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each probe call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, probe_media(path))
                .await
                .map_err(|_| MediaError::Timeout(timeout.as_secs()))?,
            None => probe_media(path).await,
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn audio_duration(&self, path: &Path) -> MediaResult<f64> {
        let info = self.probe(path).await?;
        info.duration.ok_or_else(|| {
            MediaError::invalid_media(format!("No duration reported for {}", path.display()))
        })
    }

    async fn probe_segment(&self, path: &Path) -> MediaResult<MediaInfo> {
        let info = self.probe(path).await?;
        if !info.has_video {
            return Err(MediaError::invalid_media(format!(
                "No video stream in {}",
                path.display()
            )));
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn test_parse_audio_only_output() {
        let json = br#"{
            "streams": [{"codec_type": "audio", "codec_name": "mp3"}],
            "format": {"duration": "4.284082", "size": "68958"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!(!info.has_video);
        assert!(info.has_audio);
        assert!((info.duration.unwrap() - 4.284).abs() < 0.001);
        assert_eq!(info.size, 68958);
    }

    #[test]
    fn test_parse_segment_output() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080, "avg_frame_rate": "30/1"},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "4.300000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!(info.has_video);
        assert_eq!((info.width, info.height), (1920, 1080));
        assert!((info.fps.unwrap() - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_missing_duration() {
        let json = br#"{"format": {}}"#;
        let info = parse_probe_output(json).unwrap();
        assert!(info.duration.is_none());
        assert!(!info.has_video);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_media("/definitely/not/here.mp3").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
