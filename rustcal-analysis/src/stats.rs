//! Aggregate statistics keyed by typed composite keys.
//!
//! Results are accumulated under an explicit `(pair, quantity)` key struct
//! rather than interpolated string names, so the set of metrics is closed
//! and checked at compile time.

use std::collections::BTreeMap;

use crate::compare::KinematicsDelta;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which two collections a metric compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ComparisonPair {
    /// Standalone rerun against the reference reconstruction.
    RerunVsReference,
    /// Standalone rerun against simulated truth.
    RerunVsTruth,
    /// Reference reconstruction against simulated truth.
    ReferenceVsTruth,
}

/// Which quantity a metric tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quantity {
    /// Energy difference in GeV.
    Energy,
    /// Transverse momentum difference in GeV.
    Pt,
    /// Pseudorapidity difference.
    Eta,
    /// Azimuthal difference, wrapped.
    Phi,
    /// Fractional energy difference.
    FracEnergy,
    /// Fractional transverse momentum difference.
    FracPt,
}

/// Composite key identifying one accumulated metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricKey {
    /// The compared collections.
    pub pair: ComparisonPair,
    /// The tracked quantity.
    pub quantity: Quantity,
}

/// Streaming first and second moments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunningStats {
    /// Number of accumulated samples.
    pub n: u64,
    /// Sum of samples.
    pub sum: f64,
    /// Sum of squared samples.
    pub sum_sq: f64,
}

impl RunningStats {
    /// Accumulates one sample.
    pub fn push(&mut self, value: f64) {
        self.n += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Commutative merge for parallel reduction.
    pub fn merge(&mut self, other: &Self) {
        self.n += other.n;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    /// Sample mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.n == 0 {
            None
        } else {
            Some(self.sum / self.n as f64)
        }
    }

    /// Population variance, `None` when empty.
    pub fn variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        Some((self.sum_sq / self.n as f64 - mean * mean).max(0.0))
    }
}

/// All accumulated metrics of a run, plus a count of ratio computations
/// skipped for degenerate denominators.
#[derive(Debug, Clone, Default)]
pub struct AggregateStats {
    metrics: BTreeMap<MetricKey, RunningStats>,
    /// Ratios that were undefined and therefore excluded from the metrics.
    pub undefined_ratios: usize,
}

impl AggregateStats {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates one sample under a key.
    pub fn push(&mut self, key: MetricKey, value: f64) {
        self.metrics.entry(key).or_default().push(value);
    }

    /// Accumulates a possibly-undefined ratio: `None` bumps the undefined
    /// counter and contributes nothing to the metric.
    pub fn push_ratio(&mut self, key: MetricKey, value: Option<f64>) {
        match value {
            Some(v) => self.push(key, v),
            None => self.undefined_ratios += 1,
        }
    }

    /// Accumulates every component of a kinematic comparison.
    pub fn record_delta(&mut self, pair: ComparisonPair, delta: &KinematicsDelta) {
        let key = |quantity| MetricKey { pair, quantity };
        self.push(key(Quantity::Energy), delta.d_energy);
        self.push(key(Quantity::Pt), delta.d_pt);
        self.push(key(Quantity::Eta), delta.d_eta);
        self.push(key(Quantity::Phi), delta.d_phi);
        self.push_ratio(key(Quantity::FracEnergy), delta.frac_energy);
        self.push_ratio(key(Quantity::FracPt), delta.frac_pt);
    }

    /// Looks up one metric.
    pub fn get(&self, key: &MetricKey) -> Option<&RunningStats> {
        self.metrics.get(key)
    }

    /// Iterates metrics in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &RunningStats)> {
        self.metrics.iter()
    }

    /// Commutative merge for parallel reduction: per-worker accumulators
    /// can be reduced in any order.
    pub fn merge(&mut self, other: &Self) {
        for (key, stats) in &other.metrics {
            self.metrics.entry(*key).or_default().merge(stats);
        }
        self.undefined_ratios += other.undefined_ratios;
    }
}
