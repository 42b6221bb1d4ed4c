//! rustcal-algorithms: The shower clustering engine.
//!
//! This crate implements the two-stage reconstruction:
//! - **Density-peak layer clustering** - per-layer rho/delta classification
//!   of hits into seeds, followers and halo
//! - **Multi-cluster linking** - Union-Find connected components over
//!   per-layer cluster centroids
//!
#![warn(missing_docs)]

mod density;
mod linker;
mod pipeline;
pub mod spatial;

pub use density::{LayerClusters, LayerDensityClusterer};
pub use linker::MultiClusterLinker;
pub use pipeline::{reconstruct_event, EventReco};
pub use spatial::EtaPhiGrid;

// Re-export the configuration the engine is driven by
pub use rustcal_core::config::{ClusteringConfig, DistanceMetric};
