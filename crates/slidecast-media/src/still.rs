//! Still-image normalization.
//!
//! Every row image is resized to the fixed output canvas and re-encoded
//! as an opaque JPEG before it is fed to the encoder, so segments with
//! different source sizes or formats concatenate cleanly.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, Rgb, RgbImage, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

use slidecast_models::encoding::STILL_JPEG_QUALITY;
use slidecast_models::{CANVAS_HEIGHT, CANVAS_WIDTH};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ScopedFile;

/// Normalize `source` into a `CANVAS_WIDTH`x`CANVAS_HEIGHT` JPEG at `output`.
///
/// The returned guard owns the intermediate file and deletes it when
/// dropped. If normalization fails, nothing is left behind.
pub async fn normalize_still(source: &Path, output: &Path) -> MediaResult<ScopedFile> {
    if !source.exists() {
        return Err(MediaError::FileNotFound(source.to_path_buf()));
    }

    let guard = ScopedFile::new(output);
    let source: PathBuf = source.to_path_buf();
    let target: PathBuf = output.to_path_buf();

    tokio::task::spawn_blocking(move || write_normalized(&source, &target))
        .await
        .map_err(|e| MediaError::internal(format!("Still normalization task failed: {e}")))??;

    debug!(still = %output.display(), "Normalized still image");
    Ok(guard)
}

fn write_normalized(source: &Path, target: &Path) -> MediaResult<()> {
    let img = image::open(source)?;
    let resized = img.resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3);
    let rgb = flatten_onto_black(&resized.to_rgba8());

    let mut writer = BufWriter::new(File::create(target)?);
    JpegEncoder::new_with_quality(&mut writer, STILL_JPEG_QUALITY).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;

    Ok(())
}

/// Composite an RGBA buffer over an opaque black background.
pub fn flatten_onto_black(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
