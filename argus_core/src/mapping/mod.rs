// argus_core/src/mapping/mod.rs

use nalgebra::DMatrix;

use crate::error::MapError;
use crate::messages::Observation;
use crate::models::potential::PairwisePotential;
use crate::models::sensor::EvidenceModel;
use crate::types::GridDims;

// --- The Mapper Trait ("Contract") ---
/// The contract for any algorithm that performs the occupancy-mapping role:
/// fold one sensing step into the persistent belief state.
pub trait OccupancyMapper: Send + Sync {
    /// Integrates one observation. Invoked once per observation step; the
    /// belief is fully updated before the call returns.
    fn integrate(
        &mut self,
        observation: &Observation,
        evidence_model: &dyn EvidenceModel,
        potential: &PairwisePotential,
    ) -> Result<(), MapError>;

    /// The current scalar belief grid, `P(occupied)` per cell. Read-only
    /// from the planner's and logger's perspective.
    fn belief(&self) -> &DMatrix<f64>;

    fn dims(&self) -> GridDims;
}

// --- Implementation sub-modules ---
mod dense;
mod windowed;

// --- Re-export the public structs for a clean API ---
pub use dense::DenseLbpMapper;
pub use windowed::WindowedLbpMapper;

/// Footprint-in-bounds and footprint/observation shape agreement. Both are
/// fatal configuration errors, raised before any state is touched.
pub(crate) fn validate_observation(obs: &Observation, dims: GridDims) -> Result<(), MapError> {
    let fp = obs.footprint;
    if !fp.fits(dims) {
        return Err(MapError::FootprintOutOfBounds {
            i_min: fp.i_min,
            i_max: fp.i_max,
            j_min: fp.j_min,
            j_max: fp.j_max,
            rows: dims.rows,
            cols: dims.cols,
        });
    }
    if obs.values.nrows() != fp.rows() || obs.values.ncols() != fp.cols() {
        return Err(MapError::ShapeMismatch {
            expected_rows: fp.rows(),
            expected_cols: fp.cols(),
            got_rows: obs.values.nrows(),
            got_cols: obs.values.ncols(),
        });
    }
    Ok(())
}
