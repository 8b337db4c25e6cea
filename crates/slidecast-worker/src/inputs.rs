//! Row source loading and image lookup.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use slidecast_models::RowRecord;

use crate::error::{WorkerError, WorkerResult};

/// Extensions tried, in order, when resolving a row's image.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Parse rows from a JSON array of objects keyed by column name.
///
/// A record missing either required column aborts the whole load.
pub fn parse_rows(value: &Value) -> WorkerResult<Vec<RowRecord>> {
    let items = value
        .as_array()
        .ok_or_else(|| WorkerError::invalid_row_source("top-level value is not an array"))?;

    let rows = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| {
                WorkerError::invalid_row_source(format!("row {} is not an object", index))
            })?;
            Ok(RowRecord::from_json_object(index, object)?)
        })
        .collect::<WorkerResult<Vec<_>>>()?;

    if rows.is_empty() {
        return Err(WorkerError::EmptyRows);
    }

    Ok(rows)
}

/// Read and parse a JSON row file.
pub async fn load_rows(path: impl AsRef<Path>) -> WorkerResult<Vec<RowRecord>> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    let value: Value = serde_json::from_slice(&bytes)?;
    parse_rows(&value)
}

/// Ensure the image folder exists and is a directory.
pub async fn check_image_folder(dir: &Path) -> WorkerResult<()> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(WorkerError::ImageFolder(dir.to_path_buf())),
    }
}

/// Find `{name}.jpg`, `{name}.jpeg` or `{name}.png` in `dir`, in that order.
pub async fn resolve_image(dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    for ext in IMAGE_EXTENSIONS {
        let candidate = dir.join(format!("{}.{}", name, ext));
        if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            debug!(image = %candidate.display(), "Resolved image");
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slidecast_models::ModelError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_rows() {
        let rows = parse_rows(&json!([
            {"image name": "intro", "text to voice": "Welcome"},
            {"image name": 42, "text to voice": "Numbers are stringified"}
        ]))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].image_name, "intro");
        assert_eq!(rows[1].image_name, "42");
    }

    #[test]
    fn test_missing_column_aborts() {
        let err = parse_rows(&json!([
            {"image name": "intro", "text to voice": "Welcome"},
            {"image name": "second"}
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Model(ModelError::MissingColumn { row: 1, column }) if column == "text to voice"
        ));
    }

    #[test]
    fn test_empty_and_malformed_sources() {
        assert!(matches!(parse_rows(&json!([])), Err(WorkerError::EmptyRows)));
        assert!(matches!(
            parse_rows(&json!({"image name": "x"})),
            Err(WorkerError::InvalidRowSource(_))
        ));
        assert!(matches!(
            parse_rows(&json!(["just a string"])),
            Err(WorkerError::InvalidRowSource(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_image_extension_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("slide.png"), b"png").unwrap();
        std::fs::write(dir.path().join("slide.jpeg"), b"jpeg").unwrap();

        let found = resolve_image(dir.path(), "slide").await.unwrap();
        assert_eq!(found.file_name().unwrap(), "slide.jpeg");

        assert!(resolve_image(dir.path(), "absent").await.is_none());
        assert!(resolve_image(dir.path(), "").await.is_none());
    }

    #[tokio::test]
    async fn test_check_image_folder() {
        let dir = TempDir::new().unwrap();
        assert!(check_image_folder(dir.path()).await.is_ok());

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            check_image_folder(&file).await,
            Err(WorkerError::ImageFolder(_))
        ));
    }

    #[tokio::test]
    async fn test_load_rows_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(
            &path,
            r#"[{"image name": "a", "text to voice": "one"}]"#,
        )
        .unwrap();

        let rows = load_rows(&path).await.unwrap();
        assert_eq!(rows[0].text, "one");
    }
}
