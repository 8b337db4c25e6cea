//! End-to-end rendering against a real `ffmpeg`.

use image::{Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

use slidecast_media::{
    FfmpegConcatenator, FfmpegSegmentRenderer, FfprobeProber, MediaProber, SegmentConcatenator,
    SegmentRenderer,
};

async fn make_tone(path: &Path, seconds: f64) {
    let status = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=440:duration={seconds}"))
        .args(["-c:a", "libmp3lame"])
        .arg(path)
        .status()
        .await
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_segment_duration_matches_audio() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("slide.png");
    let audio = dir.path().join("row-0000-slide.mp3");
    let output = dir.path().join("row-0000-slide.mp4");

    RgbaImage::from_pixel(320, 200, Rgba([40, 90, 160, 255]))
        .save(&image)
        .unwrap();
    make_tone(&audio, 2.5).await;

    let prober = FfprobeProber::new();
    let duration = prober.audio_duration(&audio).await.unwrap();

    FfmpegSegmentRenderer::new(1)
        .render(&image, &audio, &output, duration)
        .await
        .unwrap();

    let info = prober.probe_segment(&output).await.unwrap();
    assert_eq!((info.width, info.height), (1920, 1080));
    assert!(info.has_audio);
    assert!((info.duration.unwrap() - duration).abs() < 0.5);

    // Intermediate still is gone
    assert!(!dir.path().join("row-0000-slide.still.jpg").exists());
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_concat_two_segments() {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("slide.png");
    RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255]))
        .save(&image)
        .unwrap();

    let renderer = FfmpegSegmentRenderer::new(2);
    let prober = FfprobeProber::new();
    let mut segments = Vec::new();
    for i in 0..2 {
        let audio = dir.path().join(format!("row-{i:04}.mp3"));
        let video = dir.path().join(format!("row-{i:04}.mp4"));
        make_tone(&audio, 1.0).await;
        let duration = prober.audio_duration(&audio).await.unwrap();
        segments.push(renderer.render(&image, &audio, &video, duration).await.unwrap());
    }

    let output = dir.path().join("joined.mp4");
    FfmpegConcatenator::new()
        .concat(&segments, &output)
        .await
        .unwrap();

    let info = prober.probe_segment(&output).await.unwrap();
    assert!(info.duration.unwrap() > 1.5);
    assert!(!dir.path().join("joined.concat.txt").exists());
}
