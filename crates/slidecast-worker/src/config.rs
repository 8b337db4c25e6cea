//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum rows processed at the same time
    pub max_concurrent_rows: usize,
    /// Maximum concurrent FFmpeg processes across all rows
    pub max_ffmpeg_processes: usize,
    /// Per-segment encode timeout
    pub render_timeout: Duration,
    /// Timeout for the final concatenation
    pub concat_timeout: Duration,
    /// Timeout for each ffprobe call
    pub probe_timeout: Duration,
    /// Parent directory for per-run scratch workspaces
    pub work_dir: String,
    /// Prometheus listener address, when metrics are exported
    pub metrics_addr: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_rows: 4,
            max_ffmpeg_processes: 2,
            render_timeout: Duration::from_secs(600),
            concat_timeout: Duration::from_secs(1800),
            probe_timeout: Duration::from_secs(30),
            work_dir: "/tmp/slidecast".to_string(),
            metrics_addr: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_rows: std::env::var("WORKER_MAX_ROWS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(4),
            max_ffmpeg_processes: std::env::var("WORKER_MAX_FFMPEG")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(2),
            render_timeout: Duration::from_secs(
                std::env::var("WORKER_RENDER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            concat_timeout: Duration::from_secs(
                std::env::var("WORKER_CONCAT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            probe_timeout: Duration::from_secs(
                std::env::var("WORKER_PROBE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/slidecast".to_string()),
            metrics_addr: std::env::var("METRICS_ADDR")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_rows, 4);
        assert_eq!(config.max_ffmpeg_processes, 2);
        assert_eq!(config.render_timeout, Duration::from_secs(600));
        assert_eq!(config.concat_timeout, Duration::from_secs(1800));
        assert!(config.metrics_addr.is_none());
    }
}
