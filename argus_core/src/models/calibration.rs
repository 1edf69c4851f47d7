// argus_core/src/models/calibration.rs

//! Monte-Carlo estimation of the sensor's asymmetric error rates.
//!
//! The estimator samples the closed-form binary channel at a given altitude,
//! accumulates a confusion matrix between true and observed labels, and
//! extracts the false-free / false-occupied rates. Built once per run over a
//! small altitude ladder and treated as read-only afterwards.

use std::collections::BTreeMap;

use nalgebra::Matrix2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::sensor::SensorParams;

/// Epsilon added to confusion-matrix counts before row normalization, so the
/// extracted error rates stay strictly positive.
pub const ROW_EPSILON: f64 = 1e-6;

/// Two-sided 95% normal quantile, for the sample-size formula.
const Z_95: f64 = 1.96;

/// Floor for the sample count; the normal-approximation formula collapses to
/// zero as `sigma` does.
const MIN_SAMPLES: usize = 100;

/// Altitudes are rounded to two decimals before keying so a lookup at a
/// recomputed altitude hits the entry that calibrated it.
fn altitude_key(altitude: f64) -> i64 {
    (altitude * 100.0).round() as i64
}

/// Lookup table from rounded altitude to `(s0, s1)`:
/// `s0 = P(observe free | occupied)`, `s1 = P(observe occupied | free)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    entries: BTreeMap<i64, (f64, f64)>,
}

impl CalibrationTable {
    pub fn insert(&mut self, altitude: f64, s0: f64, s1: f64) {
        self.entries.insert(altitude_key(altitude), (s0, s1));
    }

    pub fn lookup(&self, altitude: f64) -> Option<(f64, f64)> {
        self.entries.get(&altitude_key(altitude)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Monte-Carlo calibration of the closed-form channel.
#[derive(Debug, Clone)]
pub struct CalibrationEstimator {
    params: SensorParams,
}

impl CalibrationEstimator {
    pub fn new(params: SensorParams) -> Self {
        Self { params }
    }

    /// Sample count for a target margin of error `e` at the given altitude,
    /// from the normal approximation `n = z^2 * p * (1 - p) / e^2` with
    /// `p = sigma(altitude)`.
    pub fn required_samples(&self, altitude: f64, margin_of_error: f64) -> usize {
        assert!(margin_of_error > 0.0, "margin of error must be positive");
        let p = self.params.sigma(altitude);
        let n = (Z_95 * Z_95 * p * (1.0 - p) / (margin_of_error * margin_of_error)).ceil();
        (n as usize).max(MIN_SAMPLES)
    }

    /// Runs the sampling channel `samples` times over the `[0, 1]` reference
    /// pattern and returns the row-normalized confusion matrix together with
    /// the extracted `(s0, s1)` pair.
    ///
    /// Rows index the true label, columns the observed label.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        altitude: f64,
        samples: usize,
        rng: &mut R,
    ) -> (Matrix2<f64>, (f64, f64)) {
        let sigma = self.params.sigma(altitude);
        let mut counts = [[0u64; 2]; 2];

        for _ in 0..samples {
            for truth in [0usize, 1usize] {
                let flipped = rng.gen::<f64>() < sigma;
                let observed = if flipped { 1 - truth } else { truth };
                counts[truth][observed] += 1;
            }
        }

        let mut confusion = Matrix2::zeros();
        for truth in 0..2 {
            let row_total =
                counts[truth][0] as f64 + counts[truth][1] as f64 + 2.0 * ROW_EPSILON;
            for observed in 0..2 {
                confusion[(truth, observed)] =
                    (counts[truth][observed] as f64 + ROW_EPSILON) / row_total;
            }
        }

        // s0: observed free although occupied; s1: observed occupied although free.
        let s0 = confusion[(1, 0)];
        let s1 = confusion[(0, 1)];
        (confusion, (s0, s1))
    }

    /// Calibrates every altitude of the ladder and caches the rates.
    pub fn build_table<R: Rng + ?Sized>(
        &self,
        altitudes: &[f64],
        margin_of_error: f64,
        rng: &mut R,
    ) -> CalibrationTable {
        let mut table = CalibrationTable::default();
        for &altitude in altitudes {
            let samples = self.required_samples(altitude, margin_of_error);
            let (_, (s0, s1)) = self.estimate(altitude, samples, rng);
            table.insert(altitude, s0, s1);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sample_size_follows_the_normal_approximation() {
        let estimator = CalibrationEstimator::new(SensorParams::default());
        let altitude = 40.0;
        let p = SensorParams::default().sigma(altitude);
        let expected = (1.96f64 * 1.96 * p * (1.0 - p) / (0.02 * 0.02)).ceil() as usize;
        assert_eq!(estimator.required_samples(altitude, 0.02), expected);
    }

    #[test]
    fn sample_size_is_floored_near_the_ground() {
        let estimator = CalibrationEstimator::new(SensorParams::default());
        assert_eq!(estimator.required_samples(0.0, 0.02), 100);
    }

    #[test]
    fn confusion_rows_sum_to_one() {
        let estimator = CalibrationEstimator::new(SensorParams::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (confusion, _) = estimator.estimate(30.0, 1000, &mut rng);
        for truth in 0..2 {
            let row = confusion[(truth, 0)] + confusion[(truth, 1)];
            assert_abs_diff_eq!(row, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn estimates_converge_to_the_closed_form_rate() {
        let params = SensorParams::default();
        let estimator = CalibrationEstimator::new(params);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let altitude = 25.0;
        let sigma = params.sigma(altitude);
        let (_, (s0, s1)) = estimator.estimate(altitude, 10_000, &mut rng);
        assert!((s0 - sigma).abs() < 0.05, "s0 = {}, sigma = {}", s0, sigma);
        assert!((s1 - sigma).abs() < 0.05, "s1 = {}, sigma = {}", s1, sigma);
    }

    #[test]
    fn table_rounds_altitudes_to_two_decimals() {
        let mut table = CalibrationTable::default();
        table.insert(5.401, 0.1, 0.2);
        assert_eq!(table.lookup(5.399), Some((0.1, 0.2)));
        assert_eq!(table.lookup(5.5), None);
    }

    #[test]
    fn build_table_covers_the_ladder() {
        let estimator = CalibrationEstimator::new(SensorParams::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let ladder = [2.0, 4.0, 6.0];
        let table = estimator.build_table(&ladder, 0.05, &mut rng);
        assert_eq!(table.len(), 3);
        for altitude in ladder {
            let (s0, s1) = table.lookup(altitude).unwrap();
            assert!(s0 > 0.0 && s1 > 0.0);
        }
    }
}
