// argus_core/src/mapping/dense.rs

//! Full-grid synchronous loopy belief propagation.
//!
//! One explicit message per directed grid edge, double-buffered per pass.
//! This is O(grid-area x iterations) per observation step and serves as the
//! semantic reference the windowed engine must match on full re-convergence
//! from a uniform prior.
//!
//! Messages live in an owned arena: four fixed `[P(free), P(occupied)]`
//! slots per cell, one per incoming direction, with existence decided by the
//! grid bounds. Passes visit cells in lexicographic (row, col, direction)
//! order, so floating accumulation order is stable across runs.

use nalgebra::DMatrix;

use crate::error::MapError;
use crate::grid::MarginalField;
use crate::mapping::{validate_observation, OccupancyMapper};
use crate::messages::Observation;
use crate::models::potential::PairwisePotential;
use crate::models::sensor::EvidenceModel;
use crate::types::GridDims;
use crate::utils::normalize;

/// Neighbor offsets in fixed order: up, down, left, right.
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Index of the reverse edge: the message `(i, j) -> (ni, nj)` is stored on
/// `(ni, nj)` under the direction that points back at `(i, j)`.
const REVERSE: [usize; 4] = [1, 0, 3, 2];

/// The full-grid engine. Beliefs are kept in the stacked two-channel layout
/// internally; `belief()` exposes the occupied plane.
pub struct DenseLbpMapper {
    dims: GridDims,
    max_iterations: usize,
    /// Local evidence fused with the pre-update marginals.
    phi: MarginalField,
    /// `incoming[cell][d]`: message into `cell` from its neighbor in
    /// direction `d`. Slots for edges that do not exist stay at the uniform
    /// message and are never read.
    incoming: Vec<[[f64; 2]; 4]>,
    scratch: Vec<[[f64; 2]; 4]>,
    marginals: MarginalField,
}

impl DenseLbpMapper {
    pub fn new(dims: GridDims, max_iterations: usize) -> Self {
        let uniform = vec![[[0.5, 0.5]; 4]; dims.cell_count()];
        Self {
            dims,
            max_iterations,
            phi: MarginalField::uniform(dims),
            incoming: uniform.clone(),
            scratch: uniform,
            marginals: MarginalField::uniform(dims),
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// The stacked two-channel marginals (both call patterns stay usable).
    pub fn marginals(&self) -> &MarginalField {
        &self.marginals
    }

    fn cell_index(&self, i: usize, j: usize) -> usize {
        i * self.dims.cols + j
    }

    fn neighbor(&self, i: usize, j: usize, d: usize) -> Option<(usize, usize)> {
        let (di, dj) = NEIGHBOR_OFFSETS[d];
        let ni = i.checked_add_signed(di)?;
        let nj = j.checked_add_signed(dj)?;
        self.dims.contains(ni, nj).then_some((ni, nj))
    }

    /// One synchronous pass: every existing directed edge is recomputed from
    /// the front buffer and written to the back buffer, then the buffers are
    /// published wholesale.
    fn pass(&mut self, potential: &PairwisePotential) {
        let psi = potential.matrix();
        for i in 0..self.dims.rows {
            for j in 0..self.dims.cols {
                let idx = self.cell_index(i, j);
                for d in 0..4 {
                    let Some((ni, nj)) = self.neighbor(i, j, d) else {
                        continue;
                    };
                    // Product of incoming messages from the *other* neighbors.
                    let mut prod = [1.0, 1.0];
                    for d2 in 0..4 {
                        if d2 == d || self.neighbor(i, j, d2).is_none() {
                            continue;
                        }
                        let msg = self.incoming[idx][d2];
                        prod[0] *= msg[0];
                        prod[1] *= msg[1];
                    }
                    let v0 = self.phi.free[(i, j)] * prod[0];
                    let v1 = self.phi.occupied[(i, j)] * prod[1];
                    // Row-vector times psi, then normalize.
                    let out0 = v0 * psi[(0, 0)] + v1 * psi[(1, 0)];
                    let out1 = v0 * psi[(0, 1)] + v1 * psi[(1, 1)];
                    let (out0, out1) = normalize::normalize_pair(out0, out1);
                    let receiver = self.cell_index(ni, nj);
                    self.scratch[receiver][REVERSE[d]] = [out0, out1];
                }
            }
        }
        self.incoming.copy_from_slice(&self.scratch);
    }

    /// Per-cell marginal: normalized product of the local evidence and all
    /// incoming messages.
    fn marginalize(&mut self) {
        for i in 0..self.dims.rows {
            for j in 0..self.dims.cols {
                let idx = self.cell_index(i, j);
                let mut prod = [1.0, 1.0];
                for d in 0..4 {
                    if self.neighbor(i, j, d).is_none() {
                        continue;
                    }
                    let msg = self.incoming[idx][d];
                    prod[0] *= msg[0];
                    prod[1] *= msg[1];
                }
                let (free, occupied) = normalize::normalize_pair(
                    self.phi.free[(i, j)] * prod[0],
                    self.phi.occupied[(i, j)] * prod[1],
                );
                assert!(
                    (0.0..=1.0).contains(&occupied),
                    "marginal out of range at ({}, {}): {}",
                    i,
                    j,
                    occupied
                );
                self.marginals.free[(i, j)] = free;
                self.marginals.occupied[(i, j)] = occupied;
            }
        }
    }
}

impl OccupancyMapper for DenseLbpMapper {
    fn integrate(
        &mut self,
        observation: &Observation,
        evidence_model: &dyn EvidenceModel,
        potential: &PairwisePotential,
    ) -> Result<(), MapError> {
        validate_observation(observation, self.dims)?;
        let fp = observation.footprint;
        if fp.is_empty() {
            return Ok(());
        }

        // Fuse the observation likelihoods with the current marginals into
        // the evidence field, footprint cells only.
        let evidence = evidence_model.evidence(&observation.values, observation.altitude)?;
        for c in 0..fp.cols() {
            for r in 0..fp.rows() {
                let (i, j) = (fp.i_min + r, fp.j_min + c);
                let (free, occupied) = normalize::normalize_pair(
                    evidence.free[(r, c)] * self.marginals.free[(i, j)],
                    evidence.occupied[(r, c)] * self.marginals.occupied[(i, j)],
                );
                self.phi.free[(i, j)] = free;
                self.phi.occupied[(i, j)] = occupied;
            }
        }

        for _ in 0..self.max_iterations {
            self.pass(potential);
        }
        self.marginalize();
        Ok(())
    }

    fn belief(&self) -> &DMatrix<f64> {
        &self.marginals.occupied
    }

    fn dims(&self) -> GridDims {
        self.dims
    }
}
