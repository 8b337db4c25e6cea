//! Prometheus metrics for runs.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "slidecast_runs_total";
    pub const ROWS_TOTAL: &str = "slidecast_rows_total";
    pub const ROW_DURATION_SECONDS: &str = "slidecast_row_duration_seconds";
    pub const SEGMENTS_DROPPED_TOTAL: &str = "slidecast_segments_dropped_total";
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within the tokio runtime.
pub fn init_metrics(addr: &str) -> WorkerResult<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| WorkerError::config_error(format!("Invalid METRICS_ADDR '{}': {}", addr, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("Failed to install metrics exporter: {}", e)))
}

/// Record one finished row. `status` is "success" or a failure kind.
pub fn record_row(status: &'static str, duration_secs: f64) {
    counter!(names::ROWS_TOTAL, "status" => status).increment(1);
    histogram!(names::ROW_DURATION_SECONDS).record(duration_secs);
}

pub fn record_dropped_segments(count: usize) {
    counter!(names::SEGMENTS_DROPPED_TOTAL).increment(count as u64);
}

/// Record a finished run by outcome label.
pub fn record_run(outcome: &'static str) {
    counter!(names::RUNS_TOTAL, "outcome" => outcome).increment(1);
}
