//! Association of ground-truth clusters with raw hits.

use std::collections::HashSet;

use log::warn;

use rustcal_core::hit::{HitId, RawHit, TruthCluster};
use rustcal_core::store::HitStore;

/// The hits of one truth cluster found in the store.
#[derive(Debug, Clone, Default)]
pub struct Association {
    /// Matched hits above the energy cut, in store order.
    pub hits: Vec<RawHit>,
    /// How many hit ids the truth cluster referenced.
    pub n_referenced: usize,
    /// How many of those were present in the store, before the energy cut.
    pub n_found: usize,
    /// How many present hits fell below the energy cut.
    pub n_below_ecut: usize,
    /// Referenced ids absent from the store.
    pub missing: Vec<HitId>,
}

/// Intersects a truth cluster's hit id list with the store.
///
/// Ids the store does not know are logged, recorded in `missing` and
/// skipped; the association carries at most the available data, never an
/// error. Hits below `ecut` are excluded from `hits` but still counted in
/// `n_found` so callers can report the pre-cut association size.
pub fn associate(truth: &TruthCluster, store: &HitStore, ecut: f64) -> Association {
    let wanted: HashSet<HitId> = truth.hit_ids.iter().copied().collect();

    let mut assoc = Association {
        n_referenced: truth.hit_ids.len(),
        ..Association::default()
    };

    for hit in store.iter() {
        if !wanted.contains(&hit.id) {
            continue;
        }
        assoc.n_found += 1;
        if hit.energy < ecut {
            assoc.n_below_ecut += 1;
            continue;
        }
        assoc.hits.push(*hit);
    }

    for &id in &truth.hit_ids {
        if !store.contains(id) {
            warn!(
                "truth cluster {} references unknown hit id {}",
                truth.id, id
            );
            assoc.missing.push(id);
        }
    }

    assoc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth(id: u64, hit_ids: &[u64]) -> TruthCluster {
        TruthCluster {
            id,
            hit_ids: hit_ids.iter().map(|&i| HitId::new(i)).collect(),
            energy: 1.0,
            pt: 0.3,
            eta: 1.8,
            phi: 0.4,
        }
    }

    fn hit(id: u64, energy: f64) -> RawHit {
        RawHit::new(id, 1, 1.8, 0.4, 330.0, energy, 0.1)
    }

    #[test]
    fn test_associate_intersection_in_store_order() {
        let (store, _) = HitStore::build(vec![hit(4, 0.5), hit(1, 0.5), hit(2, 0.5)]);
        let assoc = associate(&truth(7, &[1, 2, 3]), &store, 0.0);

        let ids: Vec<u64> = assoc.hits.iter().map(|h| h.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(assoc.n_referenced, 3);
        assert_eq!(assoc.n_found, 2);
        assert_eq!(assoc.missing, vec![HitId::new(3)]);
    }

    #[test]
    fn test_associate_ecut_counted_before_filtering() {
        let (store, _) = HitStore::build(vec![hit(1, 0.5), hit(2, 0.01)]);
        let assoc = associate(&truth(7, &[1, 2]), &store, 0.05);

        assert_eq!(assoc.hits.len(), 1);
        assert_eq!(assoc.n_found, 2);
        assert_eq!(assoc.n_below_ecut, 1);
        assert!(assoc.missing.is_empty());
    }

    #[test]
    fn test_associate_empty_truth() {
        let (store, _) = HitStore::build(vec![hit(1, 0.5)]);
        let assoc = associate(&truth(7, &[]), &store, 0.0);
        assert!(assoc.hits.is_empty());
        assert_eq!(assoc.n_referenced, 0);
    }
}
