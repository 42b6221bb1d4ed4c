//! Indexed per-event hit collection.

use std::collections::HashMap;

use log::warn;

use crate::diagnostics::EventDiagnostics;
use crate::hit::{HitId, RawHit};

/// Indexed collection of the raw hits of one event.
///
/// Hits are kept in insertion order; lookup by id is O(1) amortized via a
/// side index. Malformed hits (non-finite position, negative energy) and
/// duplicate ids are skipped at build time, logged and counted; an event
/// is never aborted for bad hits.
#[derive(Debug, Clone, Default)]
pub struct HitStore {
    hits: Vec<RawHit>,
    index: HashMap<HitId, usize>,
}

impl HitStore {
    /// Builds a store from an event's raw hits in O(n).
    pub fn build(hits: impl IntoIterator<Item = RawHit>) -> (Self, EventDiagnostics) {
        let mut store = Self::default();
        let mut diagnostics = EventDiagnostics::default();

        for hit in hits {
            if !hit.is_well_formed() {
                warn!("dropping malformed hit {} (non-finite field)", hit.id);
                diagnostics.dropped_hits += 1;
                continue;
            }
            if store.index.contains_key(&hit.id) {
                warn!("skipping duplicate hit id {}", hit.id);
                diagnostics.duplicate_ids += 1;
                continue;
            }
            store.index.insert(hit.id, store.hits.len());
            store.hits.push(hit);
        }

        (store, diagnostics)
    }

    /// Looks up a hit by id.
    #[inline]
    pub fn get(&self, id: HitId) -> Option<&RawHit> {
        self.index.get(&id).map(|&i| &self.hits[i])
    }

    /// Returns true if the store holds a hit with this id.
    #[inline]
    pub fn contains(&self, id: HitId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterates over the hits in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RawHit> {
        self.hits.iter()
    }

    /// All hits on the given layer with energy at or above `ecut`,
    /// in insertion order. O(n).
    pub fn layer_hits(&self, layer: u32, ecut: f64) -> Vec<&RawHit> {
        self.hits
            .iter()
            .filter(|h| h.layer == layer && h.energy >= ecut)
            .collect()
    }

    /// Sorted list of layers that have at least one hit.
    pub fn layers(&self) -> Vec<u32> {
        let mut layers: Vec<u32> = self.hits.iter().map(|h| h.layer).collect();
        layers.sort_unstable();
        layers.dedup();
        layers
    }

    /// Number of stored hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl<'a> IntoIterator for &'a HitStore {
    type Item = &'a RawHit;
    type IntoIter = std::slice::Iter<'a, RawHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}
