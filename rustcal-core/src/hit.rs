//! Raw hit and truth cluster types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier of a raw hit within one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct HitId(pub u64);

impl HitId {
    /// Creates a new hit id.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single calorimeter energy deposit.
///
/// Created once per event from the event source, owned by the
/// [`HitStore`](crate::store::HitStore), immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawHit {
    /// Unique identifier within the event.
    pub id: HitId,
    /// Detector layer number.
    pub layer: u32,
    /// Pseudorapidity of the hit position.
    pub eta: f64,
    /// Azimuthal angle of the hit position, in (-pi, pi].
    pub phi: f64,
    /// Longitudinal position in cm.
    pub z: f64,
    /// Deposited energy in GeV.
    pub energy: f64,
    /// Transverse momentum in GeV.
    pub pt: f64,
}

impl RawHit {
    /// Creates a new raw hit.
    #[allow(clippy::too_many_arguments)]
    pub fn new(id: u64, layer: u32, eta: f64, phi: f64, z: f64, energy: f64, pt: f64) -> Self {
        Self {
            id: HitId::new(id),
            layer,
            eta,
            phi,
            z,
            energy,
            pt,
        }
    }

    /// Returns true if all numeric fields required for clustering are finite.
    pub fn is_well_formed(&self) -> bool {
        self.eta.is_finite()
            && self.phi.is_finite()
            && self.z.is_finite()
            && self.energy.is_finite()
            && self.energy >= 0.0
    }
}

/// A ground-truth simulated cluster, read-only external input.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TruthCluster {
    /// Truth cluster identifier.
    pub id: u64,
    /// Ids of the raw hits this cluster deposited energy in.
    pub hit_ids: Vec<HitId>,
    /// Total simulated energy in GeV.
    pub energy: f64,
    /// Transverse momentum in GeV.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle.
    pub phi: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_id_ordering() {
        assert!(HitId::new(3) < HitId::new(7));
        assert_eq!(HitId::new(3).as_u64(), 3);
    }

    #[test]
    fn test_well_formed_hit() {
        let hit = RawHit::new(1, 5, 1.8, 0.3, 330.0, 0.25, 0.08);
        assert!(hit.is_well_formed());
    }

    #[test]
    fn test_malformed_hit() {
        let nan_eta = RawHit::new(1, 5, f64::NAN, 0.3, 330.0, 0.25, 0.08);
        assert!(!nan_eta.is_well_formed());

        let negative_energy = RawHit::new(2, 5, 1.8, 0.3, 330.0, -0.1, 0.08);
        assert!(!negative_energy.is_well_formed());
    }
}
