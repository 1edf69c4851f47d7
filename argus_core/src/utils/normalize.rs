// argus_core/src/utils/normalize.rs

//! Numerically-safe probability normalization shared by the evidence,
//! potential and message-passing code.

use nalgebra::DMatrix;
use num_traits::Float;

/// Guard added to denominators before dividing. An all-zero pair is a defect
/// upstream; the epsilon keeps the division defined instead of propagating
/// NaN into the belief grid.
pub const NORM_EPSILON: f64 = 1e-10;

/// Normalizes a two-state probability pair so the entries sum to one.
pub fn normalize_pair<T: Float>(p0: T, p1: T) -> (T, T) {
    let eps = T::from(NORM_EPSILON).unwrap();
    let total = p0 + p1 + eps;
    (p0 / total, p1 / total)
}

/// The occupied coordinate of a normalized `(free, occupied)` pair.
pub fn occupied_fraction(p_free: f64, p_occupied: f64) -> f64 {
    p_occupied / (p_free + p_occupied + NORM_EPSILON)
}

/// Per-cell normalization of a stacked two-state field: after the call,
/// `free[(i, j)] + occupied[(i, j)]` is one everywhere (within epsilon).
pub fn normalize_field(free: &mut DMatrix<f64>, occupied: &mut DMatrix<f64>) {
    assert_eq!(free.nrows(), occupied.nrows());
    assert_eq!(free.ncols(), occupied.ncols());

    for j in 0..free.ncols() {
        for i in 0..free.nrows() {
            let (f, o) = normalize_pair(free[(i, j)], occupied[(i, j)]);
            free[(i, j)] = f;
            occupied[(i, j)] = o;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn pair_sums_to_one() {
        let (p0, p1) = normalize_pair(0.2, 0.6);
        assert_abs_diff_eq!(p0 + p1, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p1, 0.75, epsilon = 1e-9);
    }

    #[test]
    fn normalization_is_idempotent() {
        let (p0, p1) = normalize_pair(0.3, 0.7);
        let (q0, q1) = normalize_pair(p0, p1);
        assert_abs_diff_eq!(p0, q0, epsilon = 1e-9);
        assert_abs_diff_eq!(p1, q1, epsilon = 1e-9);
    }

    #[test]
    fn zero_pair_stays_finite() {
        let (p0, p1) = normalize_pair(0.0, 0.0);
        assert!(p0.is_finite() && p1.is_finite());
        assert_abs_diff_eq!(p0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p1, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn field_normalizes_every_cell() {
        let mut free = DMatrix::from_element(3, 4, 0.2);
        let mut occ = DMatrix::from_element(3, 4, 0.6);
        normalize_field(&mut free, &mut occ);
        for j in 0..4 {
            for i in 0..3 {
                assert_abs_diff_eq!(free[(i, j)] + occ[(i, j)], 1.0, epsilon = 1e-9);
            }
        }
    }
}
