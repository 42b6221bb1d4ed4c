//! High-level per-event reconstruction pipeline.

use rustcal_core::cluster::{Cluster2D, MultiCluster};
use rustcal_core::config::ClusteringConfig;
use rustcal_core::diagnostics::EventDiagnostics;
use rustcal_core::hexel::Hexel;
use rustcal_core::hit::RawHit;
use rustcal_core::store::HitStore;
use rustcal_core::Result;

use crate::density::LayerDensityClusterer;
use crate::linker::MultiClusterLinker;

/// The reconstruction outputs of one event, plain data for any consumer.
#[derive(Debug, Clone, Default)]
pub struct EventReco {
    /// Every clustered hit with its density annotations (halo included).
    pub hexels: Vec<Hexel>,
    /// Per-layer clusters in discovery order.
    pub clusters2d: Vec<Cluster2D>,
    /// Linked multi-clusters in emission order.
    pub multiclusters: Vec<MultiCluster>,
    /// Problems absorbed while building the event.
    pub diagnostics: EventDiagnostics,
}

/// Runs the full reconstruction for one event's raw hits.
///
/// Validates the configuration first; a bad configuration is the only
/// error, everything wrong with the hits themselves is absorbed into the
/// diagnostics. Events are independent, so a driver may call this from
/// parallel workers with the same configuration.
pub fn reconstruct_event(
    hits: impl IntoIterator<Item = RawHit>,
    config: &ClusteringConfig,
) -> Result<EventReco> {
    config.validate()?;

    let (store, diagnostics) = HitStore::build(hits);
    reconstruct_from_store(&store, diagnostics, config)
}

/// Runs the reconstruction on an already-built store.
pub fn reconstruct_from_store(
    store: &HitStore,
    diagnostics: EventDiagnostics,
    config: &ClusteringConfig,
) -> Result<EventReco> {
    config.validate()?;

    let clusterer = LayerDensityClusterer::new(config.clone());
    let (hexels, clusters2d) = clusterer.cluster_event(store);

    let linker = MultiClusterLinker::new(config.clone());
    let multiclusters = linker.link(&clusters2d);

    Ok(EventReco {
        hexels,
        clusters2d,
        multiclusters,
        diagnostics,
    })
}
