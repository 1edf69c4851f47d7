// argus_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::mapping::OccupancyMapper;
pub use crate::models::sensor::{Evidence, EvidenceModel};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::error::MapError;
pub use crate::footprint::{Footprint, GridGeometry};
pub use crate::grid::{BeliefMap, MarginalField};
pub use crate::messages::Observation;
pub use crate::types::{GridDims, ObserverPose};

// --- Concrete Model Implementations ---
pub use crate::mapping::{DenseLbpMapper, WindowedLbpMapper};
pub use crate::models::calibration::{CalibrationEstimator, CalibrationTable};
pub use crate::models::potential::{PairwisePotential, PotentialMode};
pub use crate::models::sensor::{CalibratedSensor, ClosedFormSensor, SensorParams};
