// argus_core/src/grid.rs

//! The belief state every other component reads and mutates.
//!
//! The canonical representation is the scalar grid of `P(occupied)`; the
//! stacked two-channel `[P(free), P(occupied)]` layout used by the full-grid
//! engine is available through conversions at the boundary.

use nalgebra::DMatrix;

use crate::error::MapError;
use crate::types::GridDims;
use crate::utils::normalize;

/// Per-cell marginal probability of occupancy, `H x W`, every entry in
/// `[0, 1]`. Created once per run with a uniform prior and mutated in place
/// once per observation step.
#[derive(Debug, Clone, PartialEq)]
pub struct BeliefMap {
    dims: GridDims,
    values: DMatrix<f64>,
}

impl BeliefMap {
    /// A fresh belief map holding the uninformative prior `0.5` everywhere.
    pub fn uniform(dims: GridDims) -> Self {
        Self {
            dims,
            values: DMatrix::from_element(dims.rows, dims.cols, 0.5),
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Writes one cell. The probability-range invariant is enforced here so
    /// a defective update is caught at the write, not at a later read.
    pub fn set(&mut self, i: usize, j: usize, p_occupied: f64) {
        assert!(
            (0.0..=1.0).contains(&p_occupied),
            "belief out of range at ({}, {}): {}",
            i,
            j,
            p_occupied
        );
        self.values[(i, j)] = p_occupied;
    }

    /// Converts to the stacked two-channel layout.
    pub fn marginals(&self) -> MarginalField {
        MarginalField::from_occupied(&self.values)
    }

    /// Overwrites the belief from a two-channel field, renormalizing each
    /// cell pair first so drift in the source cannot violate the invariant.
    pub fn set_from_marginals(&mut self, marginals: &MarginalField) -> Result<(), MapError> {
        if marginals.dims() != self.dims {
            return Err(MapError::ShapeMismatch {
                expected_rows: self.dims.rows,
                expected_cols: self.dims.cols,
                got_rows: marginals.dims().rows,
                got_cols: marginals.dims().cols,
            });
        }
        for j in 0..self.dims.cols {
            for i in 0..self.dims.rows {
                let (_, occ) =
                    normalize::normalize_pair(marginals.free[(i, j)], marginals.occupied[(i, j)]);
                self.set(i, j, occ);
            }
        }
        Ok(())
    }
}

/// The stacked two-state layout `[P(free), P(occupied)]` per cell.
/// Invariant: the two channels of a cell sum to one; `normalize` restores
/// the invariant whenever an update lets it drift.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginalField {
    pub free: DMatrix<f64>,
    pub occupied: DMatrix<f64>,
}

impl MarginalField {
    pub fn uniform(dims: GridDims) -> Self {
        Self {
            free: DMatrix::from_element(dims.rows, dims.cols, 0.5),
            occupied: DMatrix::from_element(dims.rows, dims.cols, 0.5),
        }
    }

    /// Builds the field from a scalar occupancy grid (`free = 1 - occupied`).
    pub fn from_occupied(occupied: &DMatrix<f64>) -> Self {
        Self {
            free: occupied.map(|p| 1.0 - p),
            occupied: occupied.clone(),
        }
    }

    pub fn dims(&self) -> GridDims {
        GridDims::new(self.free.nrows(), self.free.ncols())
    }

    pub fn normalize(&mut self) {
        normalize::normalize_field(&mut self.free, &mut self.occupied);
    }
}
