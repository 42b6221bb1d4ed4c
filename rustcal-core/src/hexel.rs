//! Hexel: a hit annotated with density-clustering intermediate results.

use crate::hit::{HitId, RawHit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A hit annotated with the quantities driving density-peak classification.
///
/// Derived per event by the layer clusterer and valid only within that
/// event's processing. A hexel is either halo or assigned to exactly one
/// per-layer cluster, never both.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hexel {
    /// The underlying raw hit.
    pub hit: RawHit,
    /// Local density: summed energy of all hits within the critical
    /// distance, including this hit itself.
    pub rho: f64,
    /// Distance to the nearest higher-density hit, `f64::INFINITY` when
    /// this hit is a maximal-density point.
    pub delta: f64,
    /// Id of the nearest higher-density hit, if any.
    pub nearest_higher: Option<HitId>,
    /// True if this hexel was selected as a cluster seed.
    pub is_seed: bool,
    /// True if this hexel was classified as halo (below the density
    /// threshold) and excluded from every cluster energy sum.
    pub is_halo: bool,
    /// Index of the per-layer cluster this hexel belongs to, `None` for
    /// halo hexels.
    pub cluster: Option<usize>,
}

impl Hexel {
    /// Creates an unclassified hexel for a raw hit.
    pub fn new(hit: RawHit) -> Self {
        Self {
            hit,
            rho: 0.0,
            delta: f64::INFINITY,
            nearest_higher: None,
            is_seed: false,
            is_halo: false,
            cluster: None,
        }
    }

    /// Returns the hit id.
    #[inline]
    pub fn id(&self) -> HitId {
        self.hit.id
    }

    /// Checks the halo-xor-clustered invariant.
    pub fn is_consistent(&self) -> bool {
        self.is_halo != self.cluster.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_hexel_is_unclassified() {
        let hexel = Hexel::new(RawHit::new(42, 3, 2.0, 1.0, 340.0, 0.5, 0.13));
        assert_eq!(hexel.id(), HitId::new(42));
        assert!(hexel.delta.is_infinite());
        assert!(hexel.nearest_higher.is_none());
        assert!(!hexel.is_seed);
    }

    #[test]
    fn test_consistency_invariant() {
        let mut hexel = Hexel::new(RawHit::new(1, 1, 1.7, 0.0, 325.0, 0.2, 0.07));
        // Fresh hexels are neither halo nor clustered.
        assert!(!hexel.is_consistent());

        hexel.cluster = Some(0);
        assert!(hexel.is_consistent());

        hexel.is_halo = true;
        assert!(!hexel.is_consistent());

        hexel.cluster = None;
        assert!(hexel.is_consistent());
    }
}
