// argus_core/src/models/sensor.rs

use std::fmt::Debug;

use dyn_clone::DynClone;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::models::calibration::CalibrationTable;

/// Parameters of the altitude-dependent error curve
/// `sigma(h) = a * (1 - exp(-b * h))`.
///
/// Passed in at construction; the model holds no other state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorParams {
    pub a: f64,
    pub b: f64,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self { a: 1.0, b: 0.015 }
    }
}

impl SensorParams {
    /// The symmetric per-cell error rate at the given altitude.
    pub fn sigma(&self, altitude: f64) -> f64 {
        self.a * (1.0 - (-self.b * altitude).exp())
    }
}

/// Per-cell observation likelihoods over one footprint:
/// `free[(r, c)] = P(z | cell free)`, `occupied[(r, c)] = P(z | cell occupied)`.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub free: DMatrix<f64>,
    pub occupied: DMatrix<f64>,
}

/// The sensor-model seam: anything that can turn a binary observation matrix
/// into per-cell likelihoods. Implementations are cloneable trait objects so
/// a mapper setup can be duplicated per run.
pub trait EvidenceModel: Debug + Send + Sync + DynClone {
    /// Vectorized application over an entire footprint in one call.
    /// Every produced likelihood must lie in `[0, 1]`; a violation is a
    /// defect in the model, not an input error.
    fn evidence(&self, values: &DMatrix<u8>, altitude: f64) -> Result<Evidence, MapError>;
}

dyn_clone::clone_trait_object!(EvidenceModel);

fn assert_likelihoods(evidence: &Evidence) {
    for m in [&evidence.free, &evidence.occupied] {
        for &p in m.iter() {
            assert!(
                (0.0..=1.0).contains(&p),
                "likelihood out of range: {}",
                p
            );
        }
    }
}

/// Closed-form mode: both error rates equal `sigma(altitude)`.
#[derive(Debug, Clone, Default)]
pub struct ClosedFormSensor {
    params: SensorParams,
}

impl ClosedFormSensor {
    pub fn new(params: SensorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> SensorParams {
        self.params
    }
}

impl EvidenceModel for ClosedFormSensor {
    fn evidence(&self, values: &DMatrix<u8>, altitude: f64) -> Result<Evidence, MapError> {
        let sigma = self.params.sigma(altitude);
        let evidence = Evidence {
            // z = 0: P(z|free) = 1 - sigma, P(z|occ) = sigma; reversed for z = 1.
            free: values.map(|z| if z == 0 { 1.0 - sigma } else { sigma }),
            occupied: values.map(|z| if z == 0 { sigma } else { 1.0 - sigma }),
        };
        assert_likelihoods(&evidence);
        Ok(evidence)
    }
}

/// Calibrated mode: asymmetric error rates looked up from a precomputed
/// table. `s0 = P(observe free | occupied)`, `s1 = P(observe occupied | free)`.
#[derive(Debug, Clone)]
pub struct CalibratedSensor {
    table: CalibrationTable,
}

impl CalibratedSensor {
    pub fn new(table: CalibrationTable) -> Self {
        Self { table }
    }
}

impl EvidenceModel for CalibratedSensor {
    fn evidence(&self, values: &DMatrix<u8>, altitude: f64) -> Result<Evidence, MapError> {
        let (s0, s1) = self
            .table
            .lookup(altitude)
            .ok_or(MapError::UnknownAltitude(altitude))?;
        let evidence = Evidence {
            free: values.map(|z| if z == 0 { 1.0 - s1 } else { s1 }),
            occupied: values.map(|z| if z == 0 { s0 } else { 1.0 - s0 }),
        };
        assert_likelihoods(&evidence);
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sigma_grows_with_altitude_toward_a() {
        let params = SensorParams::default();
        assert_abs_diff_eq!(params.sigma(0.0), 0.0, epsilon = 1e-12);
        assert!(params.sigma(10.0) < params.sigma(100.0));
        assert!(params.sigma(1e6) <= params.a);
    }

    #[test]
    fn closed_form_likelihoods_match_sigma() {
        let params = SensorParams::default();
        let sensor = ClosedFormSensor::new(params);
        let values = DMatrix::from_row_slice(1, 2, &[0u8, 1u8]);
        let ev = sensor.evidence(&values, 20.0).unwrap();
        let sigma = params.sigma(20.0);
        assert_abs_diff_eq!(ev.free[(0, 0)], 1.0 - sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(ev.occupied[(0, 0)], sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(ev.free[(0, 1)], sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(ev.occupied[(0, 1)], 1.0 - sigma, epsilon = 1e-12);
    }

    #[test]
    fn calibrated_sensor_uses_asymmetric_rates() {
        let mut table = CalibrationTable::default();
        table.insert(5.0, 0.1, 0.2);
        let sensor = CalibratedSensor::new(table);
        let values = DMatrix::from_row_slice(1, 2, &[0u8, 1u8]);
        let ev = sensor.evidence(&values, 5.0).unwrap();
        // z = 0: P(z|free) = 1 - s1, P(z|occ) = s0.
        assert_abs_diff_eq!(ev.free[(0, 0)], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(ev.occupied[(0, 0)], 0.1, epsilon = 1e-12);
        // z = 1: P(z|free) = s1, P(z|occ) = 1 - s0.
        assert_abs_diff_eq!(ev.free[(0, 1)], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(ev.occupied[(0, 1)], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn unknown_altitude_is_an_error() {
        let sensor = CalibratedSensor::new(CalibrationTable::default());
        let values = DMatrix::zeros(1, 1);
        assert!(matches!(
            sensor.evidence(&values, 3.0),
            Err(MapError::UnknownAltitude(_))
        ));
    }
}
