// argus_core/src/models/mod.rs

pub mod calibration;
pub mod potential;
pub mod sensor;
