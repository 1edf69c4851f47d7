// argus_core/src/models/potential.rs

//! Pairwise compatibility between neighboring cell states.
//!
//! The adaptive mode estimates spatial correlation from the most recent
//! observation only, matching the engine's incremental philosophy: the
//! potential is recomputed once per observation step, never from the whole
//! belief grid.

use nalgebra::{DMatrix, Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// How the pairwise potential is chosen for a propagation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PotentialMode {
    /// No neighbor coupling: `[[0.5, 0.5], [0.5, 0.5]]`.
    Equal,
    /// Fixed attraction toward matching states: `[[0.7, 0.3], [0.3, 0.7]]`.
    Biased,
    /// Coupling strength from the Pearson correlation of the latest
    /// observation's center/neighborhood samples.
    Adaptive,
}

/// A 2x2 compatibility matrix `psi[a][b] = compatibility(state_i = a,
/// state_j = b)`. Symmetric in all three modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwisePotential(Matrix2<f64>);

impl PairwisePotential {
    pub fn equal() -> Self {
        Self(Matrix2::from_element(0.5))
    }

    pub fn biased() -> Self {
        Self(Matrix2::new(0.7, 0.3, 0.3, 0.7))
    }

    /// Data-adaptive potential from one observed binary array.
    ///
    /// Higher spatial correlation biases neighbors toward matching states;
    /// anti-correlated or flat observations flatten the potential toward
    /// uniform.
    pub fn adaptive(observation: &DMatrix<u8>) -> Self {
        let samples = collect_block_samples(observation);
        let p = pearson_correlation(&samples);
        let e = (-p).exp();
        let same = 1.0 / (1.0 + e);
        let diff = e / (1.0 + e);
        Self(Matrix2::new(same, diff, diff, same))
    }

    /// Dispatch on the mode; `Adaptive` needs the latest observation.
    pub fn compute(
        mode: PotentialMode,
        last_observation: Option<&DMatrix<u8>>,
    ) -> Result<Self, MapError> {
        match mode {
            PotentialMode::Equal => Ok(Self::equal()),
            PotentialMode::Biased => Ok(Self::biased()),
            PotentialMode::Adaptive => last_observation
                .map(Self::adaptive)
                .ok_or(MapError::MissingObservation),
        }
    }

    pub fn matrix(&self) -> &Matrix2<f64> {
        &self.0
    }

    /// Direct 2x2 application: `psi * msg`.
    pub fn apply(&self, msg: Vector2<f64>) -> Vector2<f64> {
        self.0 * msg
    }

    /// Row-vector form `msg^T * psi`, used by the full-grid engine.
    pub fn apply_transposed(&self, msg: Vector2<f64>) -> Vector2<f64> {
        self.0.transpose() * msg
    }
}

/// Partitions the observation into non-overlapping 3x3 blocks (trailing edges
/// padded by replicating the last row/column) and collects, per block, the
/// center value and the sum of its four in-block Von Neumann neighbors.
fn collect_block_samples(observation: &DMatrix<u8>) -> Vec<(f64, f64)> {
    let rows = observation.nrows();
    let cols = observation.ncols();
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    // Replication padding expressed as a clamped read.
    let at = |i: usize, j: usize| observation[(i.min(rows - 1), j.min(cols - 1))] as f64;

    let block_rows = rows.div_ceil(3);
    let block_cols = cols.div_ceil(3);
    let mut samples = Vec::with_capacity(block_rows * block_cols);

    for bi in 0..block_rows {
        for bj in 0..block_cols {
            let ci = bi * 3 + 1;
            let cj = bj * 3 + 1;
            let center = at(ci, cj);
            let neighbors =
                at(ci - 1, cj) + at(ci + 1, cj) + at(ci, cj - 1) + at(ci, cj + 1);
            samples.push((center, neighbors));
        }
    }
    samples
}

/// Pearson correlation between the center series and the neighbor-sum
/// series; `0` for a degenerate (constant) sample.
fn pearson_correlation(samples: &[(f64, f64)]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean_c = samples.iter().map(|(c, _)| c).sum::<f64>() / n;
    let mean_n = samples.iter().map(|(_, s)| s).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sq_c = 0.0;
    let mut sq_n = 0.0;
    for (c, s) in samples {
        let dc = c - mean_c;
        let dn = s - mean_n;
        numerator += dc * dn;
        sq_c += dc * dc;
        sq_n += dn * dn;
    }

    let denominator = (sq_c * sq_n).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn checkerboard(rows: usize, cols: usize) -> DMatrix<u8> {
        DMatrix::from_fn(rows, cols, |i, j| ((i + j) % 2) as u8)
    }

    #[test]
    fn equal_and_biased_constants() {
        let eq = PairwisePotential::equal();
        assert_abs_diff_eq!(eq.matrix()[(0, 1)], 0.5, epsilon = 1e-12);
        let biased = PairwisePotential::biased();
        assert_abs_diff_eq!(biased.matrix()[(0, 0)], 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(biased.matrix()[(1, 0)], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn adaptive_is_symmetric_for_any_sample() {
        for observation in [
            checkerboard(9, 9),
            DMatrix::from_fn(7, 11, |i, j| ((i * 3 + j) % 2) as u8),
            DMatrix::from_element(5, 5, 1u8),
        ] {
            let psi = PairwisePotential::adaptive(&observation);
            assert_abs_diff_eq!(
                psi.matrix()[(0, 1)],
                psi.matrix()[(1, 0)],
                epsilon = 1e-12
            );
            assert_abs_diff_eq!(
                psi.matrix()[(0, 0)],
                psi.matrix()[(1, 1)],
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn constant_observation_flattens_to_uniform() {
        // Zero variance in both series: correlation defined as 0, so every
        // entry collapses to 0.5.
        let psi = PairwisePotential::adaptive(&DMatrix::from_element(6, 6, 1u8));
        assert_abs_diff_eq!(psi.matrix()[(0, 0)], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(psi.matrix()[(0, 1)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn clustered_observation_favors_matching_states() {
        // Left half free, right half occupied: centers agree with their
        // neighborhoods, so the diagonal should dominate.
        let observation = DMatrix::from_fn(9, 18, |_, j| u8::from(j >= 9));
        let psi = PairwisePotential::adaptive(&observation);
        assert!(psi.matrix()[(0, 0)] > psi.matrix()[(0, 1)]);
    }

    #[test]
    fn checkerboard_favors_opposing_states() {
        let psi = PairwisePotential::adaptive(&checkerboard(9, 9));
        assert!(psi.matrix()[(0, 1)] > psi.matrix()[(0, 0)]);
    }

    #[test]
    fn adaptive_without_observation_is_an_error() {
        assert_eq!(
            PairwisePotential::compute(PotentialMode::Adaptive, None),
            Err(MapError::MissingObservation)
        );
    }
}
