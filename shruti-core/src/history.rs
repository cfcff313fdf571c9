//! Bounded rolling window of recent detections.

use std::collections::VecDeque;

use crate::DetectionResult;

/// Fixed-capacity FIFO of detections. Pushing into a full history evicts the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct DetectionHistory {
    capacity: usize,
    entries: VecDeque<DetectionResult>,
}

impl DetectionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, detection: DetectionResult) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(detection);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DetectionResult> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The last `n` detections, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &DetectionResult> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    pub fn latest(&self) -> Option<&DetectionResult> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
