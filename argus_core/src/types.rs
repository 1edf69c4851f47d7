// argus_core/src/types.rs

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Grid dimensions `(rows, cols)`, fixed for the lifetime of a belief map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub rows: usize,
    pub cols: usize,
}

impl GridDims {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i < self.rows && j < self.cols
    }
}

/// The observer (a camera on a UAV): planar position plus altitude.
/// Positions are in world units, the same units as `GridGeometry` extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverPose {
    pub position: Vector2<f64>,
    pub altitude: f64,
}

impl ObserverPose {
    pub fn new(x: f64, y: f64, altitude: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            altitude,
        }
    }
}
