// argus_sim/src/metrics.rs

//! Run metrics read by the planner, the logger and nobody else: the engine
//! itself never consumes them.

use nalgebra::DMatrix;

use argus_core::types::GridDims;

/// Entropy of one Bernoulli belief, in bits. `0 log 0` is taken as 0.
pub fn binary_entropy(p: f64) -> f64 {
    let mut h = 0.0;
    for q in [p, 1.0 - p] {
        if q > 0.0 {
            h -= q * q.log2();
        }
    }
    h
}

/// Total entropy of the belief grid: the uncertainty mass the survey still
/// has to burn down.
pub fn entropy(belief: &DMatrix<f64>) -> f64 {
    belief.iter().map(|&p| binary_entropy(p)).sum()
}

/// Mean squared error of the 0.5-thresholded belief against the ground
/// truth. For binary fields this is the misclassified fraction.
pub fn mse(truth: &DMatrix<u8>, belief: &DMatrix<f64>) -> f64 {
    assert_eq!(truth.shape(), belief.shape(), "map shapes must agree");
    let mismatches: usize = truth
        .iter()
        .zip(belief.iter())
        .map(|(&t, &p)| usize::from(u8::from(p >= 0.5) != t))
        .sum();
    mismatches as f64 / truth.len() as f64
}

/// Fraction of grid cells observed at least once.
pub fn coverage(observed_cells: usize, dims: GridDims) -> f64 {
    observed_cells as f64 / dims.cell_count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn uniform_belief_has_one_bit_per_cell() {
        let belief = DMatrix::from_element(10, 10, 0.5);
        assert_abs_diff_eq!(entropy(&belief), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn certain_belief_has_no_entropy() {
        assert_abs_diff_eq!(binary_entropy(0.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(binary_entropy(1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn mse_counts_misclassified_cells() {
        let truth = DMatrix::from_row_slice(1, 4, &[0u8, 1, 1, 0]);
        let belief = DMatrix::from_row_slice(1, 4, &[0.1, 0.9, 0.2, 0.4]);
        // One cell (the 0.2 under a true 1) is on the wrong side of 0.5.
        assert_abs_diff_eq!(mse(&truth, &belief), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn coverage_is_a_fraction_of_the_grid() {
        assert_abs_diff_eq!(coverage(25, GridDims::new(10, 10)), 0.25, epsilon = 1e-12);
    }
}
