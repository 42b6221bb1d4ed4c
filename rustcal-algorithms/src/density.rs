//! Density-peak clustering of hits within one detector layer.
//!
//! For every hit the clusterer computes a local density `rho` (summed
//! energy within the critical distance `dc`) and `delta`, the distance to
//! the nearest higher-density hit. Hits that are both dense and isolated
//! become seeds; hits below the density threshold become halo; everything
//! else follows its nearest higher-density neighbor into a seed's cluster.

use log::debug;

use rustcal_core::cluster::Cluster2D;
use rustcal_core::config::ClusteringConfig;
use rustcal_core::hexel::Hexel;
use rustcal_core::hit::RawHit;
use rustcal_core::store::HitStore;

use crate::spatial::EtaPhiGrid;

/// Output of clustering a single layer.
#[derive(Debug, Clone)]
pub struct LayerClusters {
    /// Every above-threshold hit of the layer with its density annotations,
    /// halo hexels included for auditing.
    pub hexels: Vec<Hexel>,
    /// The clusters found on the layer, densest seed first.
    pub clusters: Vec<Cluster2D>,
}

/// Per-layer density-peak clusterer.
#[derive(Debug, Clone)]
pub struct LayerDensityClusterer {
    config: ClusteringConfig,
}

impl LayerDensityClusterer {
    /// Creates a clusterer for the given configuration.
    ///
    /// The configuration is assumed validated; `reconstruct_event` does so
    /// before constructing one.
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Clusters the hits of one layer.
    ///
    /// `hits` must all belong to `layer` and already be above the energy
    /// cut; `HitStore::layer_hits` produces exactly that slice. Cluster
    /// indices in the returned hexels are local to the layer.
    pub fn cluster_layer(&self, layer: u32, hits: &[&RawHit]) -> LayerClusters {
        let n = hits.len();
        let mut hexels: Vec<Hexel> = hits.iter().map(|&&h| Hexel::new(h)).collect();
        if n == 0 {
            return LayerClusters {
                hexels,
                clusters: Vec::new(),
            };
        }

        let metric = self.config.metric;

        // Local density: broad phase over the grid, exact check against dc.
        let mut grid = EtaPhiGrid::new(self.config.dc, metric);
        for (i, hit) in hits.iter().enumerate() {
            grid.insert(hit.eta, hit.phi, i);
        }
        for i in 0..n {
            let hit = hits[i];
            let mut rho = 0.0;
            for j in grid.neighborhood(hit.eta, hit.phi) {
                let other = hits[j];
                if metric.distance(hit.eta, hit.phi, other.eta, other.phi) <= self.config.dc {
                    rho += other.energy;
                }
            }
            hexels[i].rho = rho;
        }

        // Distance to the nearest strictly-denser hit. Equal densities
        // break the tie by id (the smaller id counts as lower density), so
        // the order is total and every earlier entry is denser; the first
        // entry is the layer's density maximum and keeps delta = infinity.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            hexels[b]
                .rho
                .total_cmp(&hexels[a].rho)
                .then_with(|| hexels[b].id().cmp(&hexels[a].id()))
        });

        let mut nearest_higher_idx: Vec<Option<usize>> = vec![None; n];
        for k in 1..n {
            let i = order[k];
            let hit = hits[i];
            let mut best = f64::INFINITY;
            let mut best_idx = None;
            for &j in &order[..k] {
                let other = hits[j];
                let d = metric.distance(hit.eta, hit.phi, other.eta, other.phi);
                if d < best {
                    best = d;
                    best_idx = Some(j);
                }
            }
            hexels[i].delta = best;
            hexels[i].nearest_higher = best_idx.map(|j| hits[j].id);
            nearest_higher_idx[i] = best_idx;
        }

        // Classify and hand out cluster indices to seeds in density order,
        // so cluster 0 is always the densest seed on the layer.
        let mut cluster_of: Vec<Option<usize>> = vec![None; n];
        let mut n_clusters = 0;
        for &i in &order {
            if hexels[i].rho < self.config.rho_c {
                hexels[i].is_halo = true;
            } else if hexels[i].delta >= self.config.delta_c {
                hexels[i].is_seed = true;
                cluster_of[i] = Some(n_clusters);
                n_clusters += 1;
            }
        }

        // Followers: chase the nearest-higher chain to a seed. Density
        // strictly increases along the chain, so it terminates; the visited
        // path is back-filled to keep later walks short.
        let mut path = Vec::new();
        for i in 0..n {
            if hexels[i].is_halo || cluster_of[i].is_some() {
                continue;
            }
            path.clear();
            let mut cursor = i;
            while cluster_of[cursor].is_none() {
                path.push(cursor);
                // A non-halo non-seed hexel always has a denser neighbor.
                match nearest_higher_idx[cursor] {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
            let assigned = cluster_of[cursor];
            for &p in &path {
                cluster_of[p] = assigned;
            }
        }

        for i in 0..n {
            hexels[i].cluster = cluster_of[i];
        }

        // Collect members per cluster in input order; halo stays out.
        let mut members: Vec<Vec<&RawHit>> = vec![Vec::new(); n_clusters];
        for i in 0..n {
            if let Some(c) = cluster_of[i] {
                members[c].push(hits[i]);
            }
        }
        let clusters: Vec<Cluster2D> = members
            .iter()
            .map(|m| Cluster2D::from_members(layer, m))
            .collect();

        debug!(
            "layer {}: {} hits, {} clusters, {} halo",
            layer,
            n,
            clusters.len(),
            hexels.iter().filter(|h| h.is_halo).count()
        );

        LayerClusters { hexels, clusters }
    }

    /// Clusters every layer of an event.
    ///
    /// Layers are processed in ascending order and cluster indices are
    /// globalized across the event, so the returned `Cluster2D` sequence is
    /// ordered by layer first, then by per-layer density rank. The
    /// multi-cluster linker relies on this discovery order.
    pub fn cluster_event(&self, store: &HitStore) -> (Vec<Hexel>, Vec<Cluster2D>) {
        let mut all_hexels = Vec::new();
        let mut all_clusters = Vec::new();

        for layer in store.layers() {
            let hits = store.layer_hits(layer, self.config.ecut);
            if hits.is_empty() {
                continue;
            }
            let mut result = self.cluster_layer(layer, &hits);
            let offset = all_clusters.len();
            for hexel in &mut result.hexels {
                hexel.cluster = hexel.cluster.map(|c| c + offset);
            }
            all_hexels.append(&mut result.hexels);
            all_clusters.append(&mut result.clusters);
        }

        (all_hexels, all_clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hit(id: u64, layer: u32, eta: f64, phi: f64, energy: f64) -> RawHit {
        RawHit::new(id, layer, eta, phi, 330.0, energy, 0.0)
    }

    fn config() -> ClusteringConfig {
        ClusteringConfig::new()
            .with_ecut(0.01)
            .with_dc(0.05)
            .with_rho_c(0.1)
            .with_delta_c(0.05)
    }

    #[test]
    fn test_tight_group_plus_isolated_halo() {
        // Three hits within dc of each other and one far-away low-energy hit.
        let a = hit(1, 5, 1.800, 0.400, 0.20);
        let b = hit(2, 5, 1.810, 0.405, 0.15);
        let c = hit(3, 5, 1.805, 0.410, 0.10);
        let lone = hit(4, 5, 3.000, -2.000, 0.02);

        let clusterer = LayerDensityClusterer::new(config());
        let result = clusterer.cluster_layer(5, &[&a, &b, &c, &lone]);

        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].nhits(), 3);
        assert_relative_eq!(result.clusters[0].energy, 0.45, epsilon = 1e-12);

        let lone_hexel = result.hexels.iter().find(|h| h.id().as_u64() == 4).unwrap();
        assert!(lone_hexel.is_halo);
        assert!(lone_hexel.cluster.is_none());
        // The isolated hit only sees itself within dc.
        assert_relative_eq!(lone_hexel.rho, 0.02);
    }

    #[test]
    fn test_two_density_peaks_split() {
        // Two well-separated groups, each dense enough to seed.
        let hits = [
            hit(1, 3, 1.80, 0.40, 0.30),
            hit(2, 3, 1.81, 0.40, 0.10),
            hit(3, 3, 2.40, -1.00, 0.25),
            hit(4, 3, 2.41, -1.00, 0.12),
        ];
        let refs: Vec<&RawHit> = hits.iter().collect();

        let clusterer = LayerDensityClusterer::new(config());
        let result = clusterer.cluster_layer(3, &refs);

        assert_eq!(result.clusters.len(), 2);
        // Densest seed first: the (1, 2) group has rho 0.40.
        assert_relative_eq!(result.clusters[0].energy, 0.40, epsilon = 1e-12);
        assert_relative_eq!(result.clusters[1].energy, 0.37, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_energy_hits_all_halo() {
        let a = hit(1, 5, 1.80, 0.40, 0.0);
        let b = hit(2, 5, 1.81, 0.40, 0.0);

        let clusterer = LayerDensityClusterer::new(config().with_ecut(0.0));
        let result = clusterer.cluster_layer(5, &[&a, &b]);

        assert!(result.clusters.is_empty());
        assert!(result.hexels.iter().all(|h| h.is_halo && !h.is_seed));
    }

    #[test]
    fn test_empty_layer() {
        let clusterer = LayerDensityClusterer::new(config());
        let result = clusterer.cluster_layer(1, &[]);
        assert!(result.hexels.is_empty());
        assert!(result.clusters.is_empty());
    }

    #[test]
    fn test_equal_rho_tiebreak_is_deterministic() {
        // Two identical-energy hits within dc: both see rho = sum of both.
        // The larger id counts as denser, so it becomes the seed and the
        // smaller id follows it.
        let a = hit(10, 5, 1.800, 0.400, 0.2);
        let b = hit(11, 5, 1.802, 0.400, 0.2);

        let clusterer = LayerDensityClusterer::new(config());
        let result = clusterer.cluster_layer(5, &[&a, &b]);

        assert_eq!(result.clusters.len(), 1);
        let seed = result.hexels.iter().find(|h| h.is_seed).unwrap();
        assert_eq!(seed.id().as_u64(), 11);
        let follower = result.hexels.iter().find(|h| !h.is_seed).unwrap();
        assert_eq!(follower.nearest_higher.map(|id| id.as_u64()), Some(11));
        assert!(follower.delta < 0.05);
    }

    #[test]
    fn test_halo_excluded_from_energy() {
        // A dense pair plus a nearby-but-not-within-dc weak hit: the weak
        // hit's density stays below rho_c, so it is halo and its energy is
        // not in the cluster sum.
        let a = hit(1, 5, 1.800, 0.400, 0.30);
        let b = hit(2, 5, 1.805, 0.400, 0.20);
        let weak = hit(3, 5, 1.900, 0.400, 0.05);

        let clusterer = LayerDensityClusterer::new(config());
        let result = clusterer.cluster_layer(5, &[&a, &b, &weak]);

        assert_eq!(result.clusters.len(), 1);
        assert_relative_eq!(result.clusters[0].energy, 0.50, epsilon = 1e-12);

        let layer_energy: f64 = [&a, &b, &weak].iter().map(|h| h.energy).sum();
        assert!(result.clusters[0].energy < layer_energy);
    }

    #[test]
    fn test_cluster_event_globalizes_indices() {
        let (store, _) = HitStore::build(vec![
            hit(1, 1, 1.80, 0.40, 0.30),
            hit(2, 1, 1.81, 0.40, 0.20),
            hit(3, 2, 1.80, 0.40, 0.30),
            hit(4, 2, 1.81, 0.40, 0.20),
        ]);
        let clusterer = LayerDensityClusterer::new(config());
        let (hexels, clusters) = clusterer.cluster_event(&store);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].layer, 1);
        assert_eq!(clusters[1].layer, 2);

        let layer2_cluster: Vec<usize> = hexels
            .iter()
            .filter(|h| h.hit.layer == 2)
            .filter_map(|h| h.cluster)
            .collect();
        assert!(layer2_cluster.iter().all(|&c| c == 1));
    }
}
