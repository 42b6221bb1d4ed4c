//! Spatial indexing for efficient neighbor lookup in detector coordinates.

use std::collections::HashMap;

use rustcal_core::config::DistanceMetric;

/// Hash-grid over (eta, phi) for broad-phase neighbor queries.
///
/// Cells are square with side `cell_size`; a 3x3 neighborhood query returns
/// every candidate within `cell_size` of the query point, callers do the
/// exact metric check. Under the eta-phi metric the phi axis wraps, so
/// queries near the +-pi seam see both sides.
#[derive(Debug)]
pub struct EtaPhiGrid {
    cell_size: f64,
    /// Number of phi columns when the phi axis wraps; `None` for planar
    /// coordinates.
    n_phi: Option<i64>,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl EtaPhiGrid {
    /// Creates a grid with the given cell size under the given metric.
    ///
    /// `cell_size` must be positive; the caller validates it as part of the
    /// clustering configuration.
    pub fn new(cell_size: f64, metric: DistanceMetric) -> Self {
        let n_phi = match metric {
            DistanceMetric::EtaPhi => {
                Some(((std::f64::consts::TAU / cell_size).ceil() as i64).max(1))
            }
            DistanceMetric::Plane => None,
        };
        Self {
            cell_size,
            n_phi,
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, eta: f64, phi: f64) -> (i64, i64) {
        let row = (eta / self.cell_size).floor() as i64;
        let col = (phi / self.cell_size).floor() as i64;
        (row, self.wrap_col(col))
    }

    fn wrap_col(&self, col: i64) -> i64 {
        match self.n_phi {
            Some(n) => col.rem_euclid(n),
            None => col,
        }
    }

    /// Inserts an index at the given coordinates.
    pub fn insert(&mut self, eta: f64, phi: f64, index: usize) {
        let cell = self.cell_of(eta, phi);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Collects all indices in the 3x3 cell neighborhood around a point.
    ///
    /// Wrapped phi columns are deduplicated so no candidate is reported
    /// twice even when the grid is only one or two columns wide.
    pub fn neighborhood(&self, eta: f64, phi: f64) -> Vec<usize> {
        let (row, col) = self.cell_of(eta, phi);
        let mut cols = [0i64; 3];
        let mut n_cols = 0;
        for dc in -1..=1 {
            let wrapped = self.wrap_col(col + dc);
            if !cols[..n_cols].contains(&wrapped) {
                cols[n_cols] = wrapped;
                n_cols += 1;
            }
        }

        let mut result = Vec::new();
        for dr in -1..=1 {
            for &c in &cols[..n_cols] {
                if let Some(values) = self.cells.get(&(row + dr, c)) {
                    result.extend(values.iter().copied());
                }
            }
        }
        result
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
