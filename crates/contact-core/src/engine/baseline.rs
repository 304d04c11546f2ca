//! Baseline tracker
//!
//! Holds the last snapshot known to be persisted. The working copy is
//! compared against it to decide whether there is anything to save, and
//! copied from it on reset.

use crate::model::ContactSnapshot;

/// Last-known-persisted snapshot
#[derive(Debug, Clone, Default)]
pub struct BaselineTracker {
    baseline: ContactSnapshot,
    seeded: bool,
}

impl BaselineTracker {
    /// Create a tracker with an all-default baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Current baseline
    pub fn baseline(&self) -> &ContactSnapshot {
        &self.baseline
    }

    /// Whether a loaded snapshot has ever been seeded
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Replace the baseline with a loaded snapshot and copy it into `working`
    pub fn seed(&mut self, snapshot: ContactSnapshot, working: &mut ContactSnapshot) {
        working.clone_from(&snapshot);
        self.baseline = snapshot;
        self.seeded = true;
    }

    /// Field-wise comparison of `working` against the baseline
    pub fn is_dirty(&self, working: &ContactSnapshot) -> bool {
        *working != self.baseline
    }

    /// Adopt a successfully persisted snapshot as the new baseline
    pub fn commit(&mut self, persisted: ContactSnapshot) {
        self.baseline = persisted;
    }

    /// Overwrite `working` with the baseline
    pub fn restore(&self, working: &mut ContactSnapshot) {
        working.clone_from(&self.baseline);
    }
}
