//! Per-layer clusters and cross-layer multi-clusters.

use crate::hit::{HitId, RawHit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Energy-weighted mean of an angular coordinate, safe across the phi seam.
fn weighted_phi(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (mut sin_sum, mut cos_sum) = (0.0, 0.0);
    for (phi, weight) in pairs {
        sin_sum += phi.sin() * weight;
        cos_sum += phi.cos() * weight;
    }
    sin_sum.atan2(cos_sum)
}

/// The set of hits clustered within one detector layer.
///
/// Energy is the exact sum of the non-halo member energies; eta, phi and z
/// are energy-weighted means over the same members.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster2D {
    /// Detector layer this cluster lives on.
    pub layer: u32,
    /// Member hit ids (seed plus followers, halo excluded).
    pub hit_ids: Vec<HitId>,
    /// Summed member energy in GeV.
    pub energy: f64,
    /// Transverse momentum in GeV.
    pub pt: f64,
    /// Energy-weighted pseudorapidity.
    pub eta: f64,
    /// Energy-weighted azimuthal angle.
    pub phi: f64,
    /// Energy-weighted longitudinal position in cm.
    pub z: f64,
}

impl Cluster2D {
    /// Builds a cluster from its non-halo member hits.
    ///
    /// Falls back to unweighted means when the summed energy is zero, so a
    /// degenerate cluster still carries a finite position.
    pub fn from_members(layer: u32, members: &[&RawHit]) -> Self {
        let energy: f64 = members.iter().map(|h| h.energy).sum();

        let (eta, phi, z) = if energy > 0.0 {
            (
                members.iter().map(|h| h.eta * h.energy).sum::<f64>() / energy,
                weighted_phi(members.iter().map(|h| (h.phi, h.energy))),
                members.iter().map(|h| h.z * h.energy).sum::<f64>() / energy,
            )
        } else {
            let n = members.len() as f64;
            (
                members.iter().map(|h| h.eta).sum::<f64>() / n,
                weighted_phi(members.iter().map(|h| (h.phi, 1.0))),
                members.iter().map(|h| h.z).sum::<f64>() / n,
            )
        };

        Self {
            layer,
            hit_ids: members.iter().map(|h| h.id).collect(),
            energy,
            pt: energy / eta.cosh(),
            eta,
            phi,
            z,
        }
    }

    /// Number of member hits.
    pub fn nhits(&self) -> usize {
        self.hit_ids.len()
    }
}

/// A 3D grouping of per-layer clusters approximating one particle shower.
///
/// Members are stored in linking order; kinematics are energy-weighted
/// aggregates over the member clusters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultiCluster {
    /// Indices of the member clusters into the event's `Cluster2D` sequence,
    /// in linking order.
    pub cluster_indices: Vec<usize>,
    /// Summed member energy in GeV.
    pub energy: f64,
    /// Transverse momentum in GeV.
    pub pt: f64,
    /// Energy-weighted pseudorapidity.
    pub eta: f64,
    /// Energy-weighted azimuthal angle.
    pub phi: f64,
    /// Energy-weighted longitudinal position in cm.
    pub z: f64,
}

impl MultiCluster {
    /// Aggregates a linked component of per-layer clusters.
    ///
    /// `indices` must be valid for `clusters`; their order is preserved as
    /// the linking order.
    pub fn from_members(indices: Vec<usize>, clusters: &[Cluster2D]) -> Self {
        let energy: f64 = indices.iter().map(|&i| clusters[i].energy).sum();

        let (eta, phi, z) = if energy > 0.0 {
            (
                indices
                    .iter()
                    .map(|&i| clusters[i].eta * clusters[i].energy)
                    .sum::<f64>()
                    / energy,
                weighted_phi(indices.iter().map(|&i| (clusters[i].phi, clusters[i].energy))),
                indices
                    .iter()
                    .map(|&i| clusters[i].z * clusters[i].energy)
                    .sum::<f64>()
                    / energy,
            )
        } else {
            let n = indices.len() as f64;
            (
                indices.iter().map(|&i| clusters[i].eta).sum::<f64>() / n,
                weighted_phi(indices.iter().map(|&i| (clusters[i].phi, 1.0))),
                indices.iter().map(|&i| clusters[i].z).sum::<f64>() / n,
            )
        };

        Self {
            cluster_indices: indices,
            energy,
            pt: energy / eta.cosh(),
            eta,
            phi,
            z,
        }
    }

    /// Number of member per-layer clusters.
    pub fn nclus(&self) -> usize {
        self.cluster_indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hit(id: u64, eta: f64, phi: f64, energy: f64) -> RawHit {
        RawHit::new(id, 7, eta, phi, 335.0, energy, 0.0)
    }

    #[test]
    fn test_cluster2d_energy_is_exact_sum() {
        let a = hit(1, 1.80, 0.50, 0.30);
        let b = hit(2, 1.82, 0.52, 0.10);
        let cluster = Cluster2D::from_members(7, &[&a, &b]);

        assert_eq!(cluster.layer, 7);
        assert_eq!(cluster.nhits(), 2);
        assert_relative_eq!(cluster.energy, 0.40);
        // Weighted eta: (1.80*0.3 + 1.82*0.1) / 0.4
        assert_relative_eq!(cluster.eta, 1.805, epsilon = 1e-12);
    }

    #[test]
    fn test_cluster2d_pt_projection() {
        let a = hit(1, 0.0, 0.0, 2.0);
        let cluster = Cluster2D::from_members(7, &[&a]);
        // cosh(0) = 1, so pt equals energy at eta 0.
        assert_relative_eq!(cluster.pt, 2.0);
    }

    #[test]
    fn test_cluster2d_phi_seam() {
        let a = hit(1, 1.8, std::f64::consts::PI - 0.01, 1.0);
        let b = hit(2, 1.8, -std::f64::consts::PI + 0.01, 1.0);
        let cluster = Cluster2D::from_members(7, &[&a, &b]);
        // Mean of two hits straddling the seam sits on the seam, not at 0.
        assert!(cluster.phi.abs() > 3.0);
    }

    #[test]
    fn test_cluster2d_zero_energy_fallback() {
        let a = hit(1, 1.0, 0.2, 0.0);
        let b = hit(2, 3.0, 0.4, 0.0);
        let cluster = Cluster2D::from_members(7, &[&a, &b]);
        assert_relative_eq!(cluster.eta, 2.0);
        assert!(cluster.phi.is_finite());
    }

    #[test]
    fn test_multicluster_aggregation() {
        let a = hit(1, 2.0, 0.1, 1.0);
        let b = hit(2, 2.0, 0.1, 3.0);
        let clusters = vec![
            Cluster2D::from_members(1, &[&a]),
            Cluster2D::from_members(2, &[&b]),
        ];
        let multi = MultiCluster::from_members(vec![0, 1], &clusters);

        assert_eq!(multi.nclus(), 2);
        assert_relative_eq!(multi.energy, 4.0);
        assert_relative_eq!(multi.eta, 2.0, epsilon = 1e-12);
        assert_eq!(multi.cluster_indices, vec![0, 1]);
    }
}
