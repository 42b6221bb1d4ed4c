//! Clustering configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transverse distance metric used for density estimation and linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceMetric {
    /// Distance in the (eta, phi) plane with phi wrapped across the
    /// +-pi seam.
    #[default]
    EtaPhi,
    /// Plain Euclidean distance treating the two coordinates as a flat
    /// plane, for detectors with native planar coordinates.
    Plane,
}

impl DistanceMetric {
    /// Distance between two points under this metric.
    #[inline]
    pub fn distance(&self, eta_a: f64, phi_a: f64, eta_b: f64, phi_b: f64) -> f64 {
        let deta = eta_a - eta_b;
        let dphi = match self {
            Self::EtaPhi => wrap_phi(phi_a - phi_b),
            Self::Plane => phi_a - phi_b,
        };
        deta.hypot(dphi)
    }
}

/// Wraps an angle difference into (-pi, pi].
#[inline]
pub fn wrap_phi(dphi: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut d = dphi % TAU;
    if d > PI {
        d -= TAU;
    } else if d <= -PI {
        d += TAU;
    }
    d
}

/// Configuration for the clustering and linking engine.
///
/// Passed by reference into each component call; there is no module-level
/// state, so multiple configurations can run concurrently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringConfig {
    /// Hit energy threshold in GeV; hits below it are ignored.
    pub ecut: f64,
    /// Critical distance for the local density estimate.
    pub dc: f64,
    /// Density threshold separating halo from clusterable hits.
    pub rho_c: f64,
    /// Isolation threshold: minimum distance-to-higher for a seed.
    pub delta_c: f64,
    /// Maximum centroid separation for linking per-layer clusters.
    pub multicluster_radius: f64,
    /// Minimum component size for an emitted multi-cluster.
    pub min_clusters: usize,
    /// Transverse distance metric.
    pub metric: DistanceMetric,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            ecut: 0.060,
            dc: 0.05,
            rho_c: 0.1,
            delta_c: 0.05,
            multicluster_radius: 0.015,
            min_clusters: 3,
            metric: DistanceMetric::EtaPhi,
        }
    }
}

impl ClusteringConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hit energy threshold.
    pub fn with_ecut(mut self, ecut: f64) -> Self {
        self.ecut = ecut;
        self
    }

    /// Sets the critical density distance.
    pub fn with_dc(mut self, dc: f64) -> Self {
        self.dc = dc;
        self
    }

    /// Sets the density threshold.
    pub fn with_rho_c(mut self, rho_c: f64) -> Self {
        self.rho_c = rho_c;
        self
    }

    /// Sets the isolation threshold.
    pub fn with_delta_c(mut self, delta_c: f64) -> Self {
        self.delta_c = delta_c;
        self
    }

    /// Sets the multi-cluster linking radius.
    pub fn with_multicluster_radius(mut self, radius: f64) -> Self {
        self.multicluster_radius = radius;
        self
    }

    /// Sets the minimum component size for multi-clusters.
    pub fn with_min_clusters(mut self, min_clusters: usize) -> Self {
        self.min_clusters = min_clusters;
        self
    }

    /// Sets the transverse distance metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Validates all parameters, failing fast on the first bad one.
    pub fn validate(&self) -> Result<()> {
        if !self.ecut.is_finite() || self.ecut < 0.0 {
            return Err(Error::Config {
                parameter: "ecut",
                value: self.ecut,
                reason: "must be finite and >= 0",
            });
        }
        if !self.dc.is_finite() || self.dc <= 0.0 {
            return Err(Error::Config {
                parameter: "dc",
                value: self.dc,
                reason: "must be finite and > 0",
            });
        }
        if !self.rho_c.is_finite() || self.rho_c < 0.0 {
            return Err(Error::Config {
                parameter: "rho_c",
                value: self.rho_c,
                reason: "must be finite and >= 0",
            });
        }
        if !self.delta_c.is_finite() || self.delta_c < 0.0 {
            return Err(Error::Config {
                parameter: "delta_c",
                value: self.delta_c,
                reason: "must be finite and >= 0",
            });
        }
        if !self.multicluster_radius.is_finite() || self.multicluster_radius <= 0.0 {
            return Err(Error::Config {
                parameter: "multicluster_radius",
                value: self.multicluster_radius,
                reason: "must be finite and > 0",
            });
        }
        if self.min_clusters < 1 {
            return Err(Error::Config {
                parameter: "min_clusters",
                value: self.min_clusters as f64,
                reason: "must be >= 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builder_chain() {
        let config = ClusteringConfig::new()
            .with_ecut(0.1)
            .with_dc(0.02)
            .with_multicluster_radius(0.03)
            .with_min_clusters(2);

        assert_relative_eq!(config.ecut, 0.1);
        assert_relative_eq!(config.dc, 0.02);
        assert_eq!(config.min_clusters, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_ecut_rejected() {
        let config = ClusteringConfig::new().with_ecut(-0.01);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_radius_rejected() {
        let config = ClusteringConfig::new().with_multicluster_radius(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_min_clusters_rejected() {
        let config = ClusteringConfig::new().with_min_clusters(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_parameter_rejected() {
        let config = ClusteringConfig::new().with_dc(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_phi_wrapping() {
        use std::f64::consts::PI;
        assert_relative_eq!(wrap_phi(0.1), 0.1);
        assert_relative_eq!(wrap_phi(2.0 * PI - 0.1), -0.1, epsilon = 1e-12);

        let metric = DistanceMetric::EtaPhi;
        let d = metric.distance(1.8, PI - 0.01, 1.8, -PI + 0.01);
        assert_relative_eq!(d, 0.02, epsilon = 1e-12);

        // The plain metric sees the full detour.
        let plane = DistanceMetric::Plane;
        assert!(plane.distance(1.8, PI - 0.01, 1.8, -PI + 0.01) > 6.0);
    }
}
