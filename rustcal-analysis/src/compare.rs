//! Comparison of cluster collections: hit-set overlap, kinematic
//! differences and efficiency flags.

use std::collections::BTreeSet;

use rustcal_core::cluster::{Cluster2D, MultiCluster};
use rustcal_core::config::wrap_phi;
use rustcal_core::hit::{HitId, TruthCluster};

/// Denominators smaller than this are treated as degenerate: the ratio is
/// reported as undefined rather than computed.
const RATIO_DENOMINATOR_FLOOR: f64 = 1e-9;

/// Set overlap between two hit id collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitSetComparison {
    /// Ids present in both collections, sorted.
    pub both: Vec<HitId>,
    /// Ids only in the left collection, sorted.
    pub only_left: Vec<HitId>,
    /// Ids only in the right collection, sorted.
    pub only_right: Vec<HitId>,
}

impl HitSetComparison {
    /// Computes intersection and both set differences.
    pub fn between(left: &[HitId], right: &[HitId]) -> Self {
        let l: BTreeSet<HitId> = left.iter().copied().collect();
        let r: BTreeSet<HitId> = right.iter().copied().collect();
        Self {
            both: l.intersection(&r).copied().collect(),
            only_left: l.difference(&r).copied().collect(),
            only_right: r.difference(&l).copied().collect(),
        }
    }
}

/// The kinematic quantities every cluster-like object exposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Energy in GeV.
    pub energy: f64,
    /// Transverse momentum in GeV.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
}

impl From<&Cluster2D> for Kinematics {
    fn from(c: &Cluster2D) -> Self {
        Self {
            energy: c.energy,
            pt: c.pt,
            eta: c.eta,
            phi: c.phi,
        }
    }
}

impl From<&MultiCluster> for Kinematics {
    fn from(m: &MultiCluster) -> Self {
        Self {
            energy: m.energy,
            pt: m.pt,
            eta: m.eta,
            phi: m.phi,
        }
    }
}

impl From<&TruthCluster> for Kinematics {
    fn from(t: &TruthCluster) -> Self {
        Self {
            energy: t.energy,
            pt: t.pt,
            eta: t.eta,
            phi: t.phi,
        }
    }
}

impl Kinematics {
    /// Angular separation in the (eta, phi) plane, phi wrapped.
    pub fn delta_r(&self, other: &Self) -> f64 {
        let deta = self.eta - other.eta;
        let dphi = wrap_phi(self.phi - other.phi);
        deta.hypot(dphi)
    }
}

/// Elementwise differences and fractional differences between a probe and
/// a reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsDelta {
    /// Probe energy minus reference energy.
    pub d_energy: f64,
    /// Probe pt minus reference pt.
    pub d_pt: f64,
    /// Probe eta minus reference eta.
    pub d_eta: f64,
    /// Probe phi minus reference phi, wrapped.
    pub d_phi: f64,
    /// `d_energy / reference energy`, `None` for a degenerate denominator.
    pub frac_energy: Option<f64>,
    /// `d_pt / reference pt`, `None` for a degenerate denominator.
    pub frac_pt: Option<f64>,
}

fn frac(delta: f64, reference: f64) -> Option<f64> {
    if reference.abs() < RATIO_DENOMINATOR_FLOOR {
        None
    } else {
        Some(delta / reference)
    }
}

impl KinematicsDelta {
    /// Compares a probe against a reference.
    pub fn between(probe: impl Into<Kinematics>, reference: impl Into<Kinematics>) -> Self {
        let p = probe.into();
        let r = reference.into();
        let d_energy = p.energy - r.energy;
        let d_pt = p.pt - r.pt;
        Self {
            d_energy,
            d_pt,
            d_eta: p.eta - r.eta,
            d_phi: wrap_phi(p.phi - r.phi),
            frac_energy: frac(d_energy, r.energy),
            frac_pt: frac(d_pt, r.pt),
        }
    }
}

/// Pairs two collections index-wise and compares each pair.
///
/// Collections of different lengths have no meaningful index alignment;
/// the result is then empty.
pub fn compare_aligned<'a, P, R>(probes: &'a [P], references: &'a [R]) -> Vec<KinematicsDelta>
where
    &'a P: Into<Kinematics>,
    &'a R: Into<Kinematics>,
{
    if probes.len() != references.len() {
        return Vec::new();
    }
    probes
        .iter()
        .zip(references.iter())
        .map(|(p, r)| KinematicsDelta::between(p, r))
        .collect()
}

/// How a reconstructed object is matched to a truth cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchCriterion {
    /// Match when the angular separation is at most this.
    DeltaR(f64),
    /// Match when at least this fraction of the truth cluster's hits
    /// appears in the reconstructed object.
    HitOverlap(f64),
}

/// Pass/fail matching result for one truth cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EfficiencyFlag {
    /// The truth cluster this flag belongs to.
    pub truth_id: u64,
    /// True when some reconstructed multi-cluster matched.
    pub passed: bool,
}

/// Flags each truth cluster as found or missed by the reconstruction.
///
/// `clusters2d` is the event's cluster sequence the multi-clusters index
/// into; it is only consulted for the hit-overlap criterion.
pub fn efficiency(
    truths: &[TruthCluster],
    multiclusters: &[MultiCluster],
    clusters2d: &[Cluster2D],
    criterion: MatchCriterion,
) -> Vec<EfficiencyFlag> {
    truths
        .iter()
        .map(|truth| {
            let passed = match criterion {
                MatchCriterion::DeltaR(max_dr) => {
                    let t = Kinematics::from(truth);
                    multiclusters
                        .iter()
                        .any(|m| Kinematics::from(m).delta_r(&t) <= max_dr)
                }
                MatchCriterion::HitOverlap(min_fraction) => {
                    !truth.hit_ids.is_empty()
                        && multiclusters.iter().any(|m| {
                            let reco_ids: BTreeSet<HitId> = m
                                .cluster_indices
                                .iter()
                                .flat_map(|&i| clusters2d[i].hit_ids.iter().copied())
                                .collect();
                            let overlap = truth
                                .hit_ids
                                .iter()
                                .filter(|id| reco_ids.contains(id))
                                .count();
                            overlap as f64 / truth.hit_ids.len() as f64 >= min_fraction
                        })
                }
            };
            EfficiencyFlag {
                truth_id: truth.id,
                passed,
            }
        })
        .collect()
}
