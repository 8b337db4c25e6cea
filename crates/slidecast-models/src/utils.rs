//! Naming helpers for derived files.

use uuid::Uuid;

/// Length of the random suffix in export file names.
pub const EXPORT_SUFFIX_LEN: usize = 6;

/// Reduce an arbitrary image name to a filesystem-safe stem.
///
/// Keeps ASCII alphanumerics, `-` and `_`; whitespace runs become `_`.
/// Empty results fall back to `"row"`.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(50)
        .collect();

    if stem.is_empty() {
        "row".to_string()
    } else {
        stem
    }
}

/// Generate the export file name: `Export-<6 hex chars>.mp4`.
pub fn export_file_name() -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(EXPORT_SUFFIX_LEN)
        .collect();
    format!("Export-{}.mp4", suffix)
}
