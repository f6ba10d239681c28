//! Lightweight current/peak occupancy tracking.
//!
//! Counts whatever unit the owner chooses (elements for the run generator).

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct PeakTracker {
    current: Cell<usize>,
    peak: Cell<usize>,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new "in use" value; updates peak if higher.
    pub fn record(&self, in_use: usize) {
        self.current.set(in_use);
        if in_use > self.peak.get() {
            self.peak.set(in_use);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(in_use, peak = self.peak.get(), "occupancy");
    }

    pub fn current(&self) -> usize {
        self.current.get()
    }

    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    /// Forget both values (owner restarted from scratch).
    pub fn clear(&self) {
        self.current.set(0);
        self.peak.set(0);
    }
}
