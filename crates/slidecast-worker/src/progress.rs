//! Progress events for the presentation layer.
//!
//! The pipeline publishes [`RunEvent`]s into an unbounded channel and
//! never waits for the consumer. If the receiving side has gone away,
//! events are dropped.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

use slidecast_models::{LogLevel, RunEvent};

/// Receiving half handed to the presentation layer.
pub type ProgressReceiver = mpsc::UnboundedReceiver<RunEvent>;

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicUsize,
    total: AtomicUsize,
}

/// Cloneable publishing handle shared by every row job.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: Option<mpsc::UnboundedSender<RunEvent>>,
    counters: Arc<Counters>,
}

impl ProgressChannel {
    /// Create a channel and its receiver.
    pub fn new() -> (Self, ProgressReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(tx),
                counters: Arc::default(),
            },
            rx,
        )
    }

    /// A channel that discards everything.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            counters: Arc::default(),
        }
    }

    /// Reset counters for a run of `units` progress steps.
    pub fn start(&self, units: usize) {
        self.counters.completed.store(0, Ordering::Release);
        self.counters.total.store(units, Ordering::Release);
    }

    pub fn publish(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                trace!("Progress receiver closed, dropping event");
            }
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        self.publish(RunEvent::log(message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.publish(RunEvent::log_with_level(LogLevel::Warn, message));
    }

    /// Count one finished row and publish it.
    pub fn row_completed(&self, row_index: usize, success: bool) {
        let completed = self.advance();
        self.publish(RunEvent::row_completed(
            row_index,
            success,
            completed,
            self.total(),
        ));
    }

    /// Count the concatenation step and publish it. A failed join still
    /// completes the step.
    pub fn concatenated(&self, segments: usize, success: bool) {
        let completed = self.advance();
        self.publish(RunEvent::concatenated(
            segments,
            success,
            completed,
            self.total(),
        ));
    }

    pub fn done(&self, output: &Path) {
        self.publish(RunEvent::done(output));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(RunEvent::error(message));
    }

    pub fn completed(&self) -> usize {
        self.counters.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.counters.total.load(Ordering::Acquire)
    }

    fn advance(&self) -> usize {
        self.counters.completed.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_row_progress_counts_up() {
        let (progress, mut rx) = ProgressChannel::new();
        progress.start(3);

        progress.row_completed(1, true);
        progress.row_completed(0, false);
        progress.concatenated(1, true);

        let fractions: Vec<f64> = (0..3)
            .map(|_| rx.try_recv().unwrap().progress_fraction().unwrap())
            .collect();
        assert!((fractions[0] - 1.0 / 3.0).abs() < 1e-9);
        assert!((fractions[1] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(fractions[2], 1.0);
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (progress, rx) = ProgressChannel::new();
        drop(rx);
        progress.log("nobody listening");
        progress.row_completed(0, true);
        assert_eq!(progress.completed(), 1);
    }

    #[test]
    fn test_disabled_channel() {
        let progress = ProgressChannel::disabled();
        progress.start(2);
        progress.error("boom");
        progress.concatenated(0, false);
        assert_eq!(progress.completed(), 1);
    }
}
