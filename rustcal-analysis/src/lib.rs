//! rustcal-analysis: Validation of the standalone reconstruction.
//!
//! Maps ground-truth clusters onto raw hits, compares reconstruction
//! outputs against truth and against a reference reconstruction, and
//! accumulates aggregate statistics keyed by typed composite keys.

#![warn(missing_docs)]

mod associate;
mod compare;
mod stats;

pub use associate::{associate, Association};
pub use compare::{
    compare_aligned, efficiency, EfficiencyFlag, HitSetComparison, Kinematics, KinematicsDelta,
    MatchCriterion,
};
pub use stats::{AggregateStats, ComparisonPair, MetricKey, Quantity, RunningStats};
