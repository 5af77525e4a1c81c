//! Per-resource dirty counters
//!
//! Each frame resource holds its own copy of every object and material
//! constant. A change therefore has to be written once per frame resource:
//! the counter is set to N on change and consumed once per upload, so the
//! change reaches all N copies and then stops costing anything.

/// Number of frame resources that still hold a stale copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyCounter {
    remaining: usize,
    frames: usize,
}

impl DirtyCounter {
    /// New counter for a ring of `frames` slots. Starts fully dirty.
    pub fn new(frames: usize) -> Self {
        Self {
            remaining: frames,
            frames,
        }
    }

    /// Record a change. Restarts propagation even if one is in progress.
    pub fn mark(&mut self) {
        self.remaining = self.frames;
    }

    /// Consume one upload. Returns whether the caller must write this frame.
    pub fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    /// Whether any frame resource is still stale
    pub fn is_dirty(&self) -> bool {
        self.remaining > 0
    }

    /// Stale frame resources left
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_reaches_zero_after_n_uploads() {
        let mut counter = DirtyCounter::new(3);
        assert_eq!(counter.remaining(), 3);

        assert!(counter.consume());
        assert!(counter.consume());
        assert!(counter.consume());
        assert!(!counter.is_dirty());
        assert!(!counter.consume());
        assert_eq!(counter.remaining(), 0);
    }

    #[test]
    fn test_mark_restarts_propagation() {
        let mut counter = DirtyCounter::new(3);
        counter.consume();
        counter.consume();
        assert_eq!(counter.remaining(), 1);

        counter.mark();
        assert_eq!(counter.remaining(), 3);
    }
}
