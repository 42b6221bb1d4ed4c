//! rustcal-core: Core types for calorimeter shower clustering.
//!
//! This crate provides the data model shared by the clustering engine and
//! the validation tooling: raw detector hits, simulated truth clusters,
//! density-annotated hexels, per-layer and cross-layer clusters, the
//! clustering configuration, and the error taxonomy.

pub mod cluster;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hexel;
pub mod hit;
pub mod store;

pub use cluster::{Cluster2D, MultiCluster};
pub use config::{ClusteringConfig, DistanceMetric};
pub use diagnostics::EventDiagnostics;
pub use error::{Error, Result};
pub use hexel::Hexel;
pub use hit::{HitId, RawHit, TruthCluster};
pub use store::HitStore;
