// argus_core/src/messages.rs

use nalgebra::DMatrix;

use crate::error::MapError;
use crate::footprint::Footprint;

/// One sensing step as delivered by the camera collaborator: the grid
/// rectangle that was seen, the binary returns for every cell in it
/// (0 = free, 1 = occupied), and the altitude the observation was taken at.
#[derive(Debug, Clone)]
pub struct Observation {
    pub footprint: Footprint,
    pub values: DMatrix<u8>,
    pub altitude: f64,
}

impl Observation {
    /// Builds an observation, checking that the value matrix matches the
    /// footprint shape. A mismatch is a configuration fault, not recoverable.
    pub fn new(footprint: Footprint, values: DMatrix<u8>, altitude: f64) -> Result<Self, MapError> {
        if values.nrows() != footprint.rows() || values.ncols() != footprint.cols() {
            return Err(MapError::ShapeMismatch {
                expected_rows: footprint.rows(),
                expected_cols: footprint.cols(),
                got_rows: values.nrows(),
                got_cols: values.ncols(),
            });
        }
        Ok(Self {
            footprint,
            values,
            altitude,
        })
    }
}
