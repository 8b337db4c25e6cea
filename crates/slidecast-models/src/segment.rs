//! Rendered segments and the row-indexed run result.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One successfully rendered row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResult {
    pub row_index: usize,
    pub path: PathBuf,
    /// Duration in seconds, taken from probing the narration audio
    pub duration: f64,
    /// Set by the validator after re-probing the segment file
    pub valid: bool,
}

impl SegmentResult {
    pub fn new(row_index: usize, path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            row_index,
            path: path.into(),
            duration,
            valid: false,
        }
    }
}

/// Result of a run: one slot per input row, addressed by row index.
///
/// Slots are filled as jobs finish, in any order; readers always walk
/// them in index order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    slots: Vec<Option<SegmentResult>>,
    /// Final exported file, when one was produced
    pub output: Option<PathBuf>,
}

impl RunResult {
    /// Create a result with `rows` empty slots.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            slots: vec![None; rows],
            output: None,
        }
    }

    /// Store a segment in its row's slot. Out-of-range indices are ignored.
    pub fn insert(&mut self, segment: SegmentResult) -> bool {
        match self.slots.get_mut(segment.row_index) {
            Some(slot) => {
                *slot = Some(segment);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, row_index: usize) -> Option<&SegmentResult> {
        self.slots.get(row_index).and_then(Option::as_ref)
    }

    /// Filled slots in row order, skipping holes.
    pub fn segments(&self) -> impl Iterator<Item = &SegmentResult> {
        self.slots.iter().flatten()
    }

    /// Mutable access to filled slots in row order.
    pub fn segments_mut(&mut self) -> impl Iterator<Item = &mut SegmentResult> {
        self.slots.iter_mut().flatten()
    }

    /// Segments marked valid, in row order.
    pub fn valid_segments(&self) -> Vec<&SegmentResult> {
        self.segments().filter(|s| s.valid).collect()
    }

    pub fn completed_count(&self) -> usize {
        self.segments().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_read_in_row_order() {
        let mut result = RunResult::with_rows(3);
        result.insert(SegmentResult::new(2, "/s/2.mp4", 1.0));
        result.insert(SegmentResult::new(0, "/s/0.mp4", 1.0));
        result.insert(SegmentResult::new(1, "/s/1.mp4", 1.0));

        let order: Vec<usize> = result.segments().map(|s| s.row_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_holes_are_skipped() {
        let mut result = RunResult::with_rows(4);
        result.insert(SegmentResult::new(3, "/s/3.mp4", 2.0));
        result.insert(SegmentResult::new(1, "/s/1.mp4", 2.0));

        assert_eq!(result.completed_count(), 2);
        assert!(result.get(0).is_none());
        assert!(result.get(2).is_none());
    }

    #[test]
    fn test_out_of_range_insert_rejected() {
        let mut result = RunResult::with_rows(1);
        assert!(!result.insert(SegmentResult::new(5, "/s/5.mp4", 1.0)));
        assert_eq!(result.completed_count(), 0);
    }

    #[test]
    fn test_valid_segments_filter() {
        let mut result = RunResult::with_rows(2);
        result.insert(SegmentResult::new(0, "/s/0.mp4", 1.0));
        result.insert(SegmentResult::new(1, "/s/1.mp4", 1.0));
        if let Some(segment) = result.segments_mut().nth(1) {
            segment.valid = true;
        }
        let valid: Vec<usize> = result.valid_segments().iter().map(|s| s.row_index).collect();
        assert_eq!(valid, vec![1]);
    }
}
