//! Re-probing of rendered segments before concatenation.

use std::sync::Arc;
use tracing::{info, warn};

use slidecast_models::RunResult;

use crate::probe::MediaProber;

/// Allowed gap between a segment's probed duration and its narration.
pub const DURATION_TOLERANCE_SECS: f64 = 0.5;

/// A segment excluded from concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedSegment {
    pub row_index: usize,
    pub reason: String,
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub accepted: usize,
    pub dropped: Vec<DroppedSegment>,
}

/// Marks segments valid only if they still probe as video files.
pub struct SegmentValidator {
    prober: Arc<dyn MediaProber>,
}

impl SegmentValidator {
    pub fn new(prober: Arc<dyn MediaProber>) -> Self {
        Self { prober }
    }

    /// Probe every filled slot in row order and set its `valid` flag.
    pub async fn validate(&self, result: &mut RunResult) -> ValidationReport {
        let mut report = ValidationReport::default();

        for segment in result.segments_mut() {
            match self.prober.probe_segment(&segment.path).await {
                Ok(info) => {
                    if let Some(probed) = info.duration {
                        if (probed - segment.duration).abs() > DURATION_TOLERANCE_SECS {
                            warn!(
                                row_index = segment.row_index,
                                expected = segment.duration,
                                probed,
                                "Segment duration differs from narration"
                            );
                        }
                    }
                    segment.valid = true;
                    report.accepted += 1;
                }
                Err(e) => {
                    warn!(
                        row_index = segment.row_index,
                        path = %segment.path.display(),
                        error = %e,
                        "Dropping segment that failed validation"
                    );
                    segment.valid = false;
                    report.dropped.push(DroppedSegment {
                        row_index: segment.row_index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            accepted = report.accepted,
            dropped = report.dropped.len(),
            "Validated segments"
        );

        report
    }
}
