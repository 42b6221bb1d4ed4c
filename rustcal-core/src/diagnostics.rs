//! Per-event diagnostic counters for recovered data problems.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts of input problems absorbed while processing one event.
///
/// These never abort the event; they are reported alongside the outputs so
/// a driver can decide whether the event is trustworthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventDiagnostics {
    /// Hits dropped for non-finite positions or negative energy.
    pub dropped_hits: usize,
    /// Hits skipped because their id duplicated an earlier one.
    pub duplicate_ids: usize,
    /// Truth-referenced hit ids absent from the store.
    pub missing_truth_hits: usize,
    /// Ratio computations skipped for a degenerate denominator.
    pub undefined_ratios: usize,
}

impl EventDiagnostics {
    /// Returns true when nothing was skipped or dropped.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Commutative merge of two counters, for parallel reduction.
    pub fn merge(&mut self, other: &Self) {
        self.dropped_hits += other.dropped_hits;
        self.duplicate_ids += other.duplicate_ids;
        self.missing_truth_hits += other.missing_truth_hits;
        self.undefined_ratios += other.undefined_ratios;
    }
}
