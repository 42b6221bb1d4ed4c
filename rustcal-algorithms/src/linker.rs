//! Cross-layer linking of per-layer clusters into multi-clusters.
//!
//! Per-layer clusters are nodes of an undirected proximity graph; an edge
//! joins two clusters whose energy-weighted centroids are within the
//! configured linking radius. Connected components are found with
//! union-find and emitted as multi-clusters when they are large enough.

use std::collections::BTreeMap;

use log::debug;

use rustcal_core::cluster::{Cluster2D, MultiCluster};
use rustcal_core::config::ClusteringConfig;

/// Union-Find data structure for connected component detection.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);

        if px == py {
            return;
        }

        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Links per-layer clusters into shower-level multi-clusters.
#[derive(Debug, Clone)]
pub struct MultiClusterLinker {
    config: ClusteringConfig,
}

impl MultiClusterLinker {
    /// Creates a linker for the given configuration.
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Groups clusters into multi-clusters.
    ///
    /// `clusters` must be in discovery order (layer ascending, then cluster
    /// index within the layer); `LayerDensityClusterer::cluster_event`
    /// produces exactly that. Components smaller than `min_clusters` are
    /// dropped, their members do not appear in any output. Emission order
    /// is by smallest member index and member order within a multi-cluster
    /// is ascending index, both reproducible run to run.
    pub fn link(&self, clusters: &[Cluster2D]) -> Vec<MultiCluster> {
        if clusters.is_empty() {
            return Vec::new();
        }

        let n = clusters.len();
        let metric = self.config.metric;
        let mut uf = UnionFind::new(n);

        for i in 0..n {
            for j in (i + 1)..n {
                let a = &clusters[i];
                let b = &clusters[j];
                let d = metric.distance(a.eta, a.phi, b.eta, b.phi);
                if d <= self.config.multicluster_radius {
                    uf.union(i, j);
                }
            }
        }

        // Scanning indices in ascending order fills each component's member
        // list in ascending order; keying by that first member makes the
        // BTreeMap iterate components by smallest member index.
        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..n {
            let root = uf.find(i);
            components.entry(root).or_default().push(i);
        }

        let mut by_first: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for members in components.into_values() {
            by_first.insert(members[0], members);
        }

        let multiclusters: Vec<MultiCluster> = by_first
            .into_values()
            .filter(|members| members.len() >= self.config.min_clusters)
            .map(|members| MultiCluster::from_members(members, clusters))
            .collect();

        debug!(
            "linked {} clusters into {} multi-clusters",
            n,
            multiclusters.len()
        );
        multiclusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rustcal_core::hit::RawHit;

    fn cluster(layer: u32, id: u64, eta: f64, phi: f64, energy: f64) -> Cluster2D {
        let hit = RawHit::new(id, layer, eta, phi, 320.0 + f64::from(layer), energy, 0.0);
        Cluster2D::from_members(layer, &[&hit])
    }

    fn config(radius: f64, min_clusters: usize) -> ClusteringConfig {
        ClusteringConfig::new()
            .with_multicluster_radius(radius)
            .with_min_clusters(min_clusters)
    }

    #[test]
    fn test_two_layers_linked() {
        let clusters = vec![
            cluster(1, 1, 1.800, 0.400, 1.0),
            cluster(2, 2, 1.805, 0.400, 2.0),
        ];

        let linker = MultiClusterLinker::new(config(0.015, 2));
        let multi = linker.link(&clusters);

        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].nclus(), 2);
        assert_eq!(multi[0].cluster_indices, vec![0, 1]);
        assert_relative_eq!(multi[0].energy, 3.0);
    }

    #[test]
    fn test_min_clusters_gate() {
        let clusters = vec![
            cluster(1, 1, 1.800, 0.400, 1.0),
            cluster(2, 2, 1.805, 0.400, 2.0),
        ];

        let linker = MultiClusterLinker::new(config(0.015, 3));
        assert!(linker.link(&clusters).is_empty());
    }

    #[test]
    fn test_undersized_components_fully_dropped() {
        // A linked pair and a far-away singleton; min_clusters = 2 keeps
        // only the pair, and the singleton appears nowhere.
        let clusters = vec![
            cluster(1, 1, 1.800, 0.400, 1.0),
            cluster(2, 2, 1.805, 0.400, 2.0),
            cluster(3, 3, 2.900, -2.000, 5.0),
        ];

        let linker = MultiClusterLinker::new(config(0.015, 2));
        let multi = linker.link(&clusters);

        assert_eq!(multi.len(), 1);
        assert!(!multi[0].cluster_indices.contains(&2));
    }

    #[test]
    fn test_out_of_radius_not_linked() {
        let clusters = vec![
            cluster(1, 1, 1.800, 0.400, 1.0),
            cluster(2, 2, 1.900, 0.400, 2.0),
        ];

        let linker = MultiClusterLinker::new(config(0.015, 1));
        let multi = linker.link(&clusters);
        assert_eq!(multi.len(), 2);
        assert_eq!(multi[0].nclus(), 1);
    }

    #[test]
    fn test_transitive_chain_links() {
        // a-b and b-c within radius, a-c not: one component of three.
        let clusters = vec![
            cluster(1, 1, 1.800, 0.400, 1.0),
            cluster(2, 2, 1.812, 0.400, 1.0),
            cluster(3, 3, 1.824, 0.400, 1.0),
        ];

        let linker = MultiClusterLinker::new(config(0.013, 3));
        let multi = linker.link(&clusters);
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].cluster_indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_input() {
        let linker = MultiClusterLinker::new(config(0.015, 1));
        assert!(linker.link(&[]).is_empty());
    }
}
