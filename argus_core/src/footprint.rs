// argus_core/src/footprint.rs

use serde::{Deserialize, Serialize};

use crate::types::{GridDims, ObserverPose};

/// World-to-grid geometry: the terrain extents in world units and the edge
/// length of one square grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub extent_x: f64,
    pub extent_y: f64,
    pub cell_size: f64,
}

impl GridGeometry {
    pub fn new(extent_x: f64, extent_y: f64, cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive");
        Self {
            extent_x,
            extent_y,
            cell_size,
        }
    }

    /// The grid shape implied by the extents. The x axis maps to rows,
    /// the y axis to columns.
    pub fn dims(&self) -> GridDims {
        GridDims::new(
            (self.extent_x / self.cell_size) as usize,
            (self.extent_y / self.cell_size) as usize,
        )
    }
}

/// The axis-aligned rectangle of grid cells touched by one observation,
/// half-open on both axes: `[i_min, i_max) x [j_min, j_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub i_min: usize,
    pub i_max: usize,
    pub j_min: usize,
    pub j_max: usize,
}

impl Footprint {
    pub fn new(i_min: usize, i_max: usize, j_min: usize, j_max: usize) -> Self {
        assert!(i_min <= i_max && j_min <= j_max, "inverted footprint");
        Self {
            i_min,
            i_max,
            j_min,
            j_max,
        }
    }

    /// A zero-area footprint; integrating one is a no-op.
    pub fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn rows(&self) -> usize {
        self.i_max - self.i_min
    }

    pub fn cols(&self) -> usize {
        self.j_max - self.j_min
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i >= self.i_min && i < self.i_max && j >= self.j_min && j < self.j_max
    }

    pub fn fits(&self, dims: GridDims) -> bool {
        self.i_max <= dims.rows && self.j_max <= dims.cols
    }

    /// The footprint grown by one cell on every side, clipped to the grid.
    /// This is the region a windowed propagation call may touch.
    pub fn with_halo(&self, dims: GridDims) -> Footprint {
        Footprint::new(
            self.i_min.saturating_sub(1),
            (self.i_max + 1).min(dims.rows),
            self.j_min.saturating_sub(1),
            (self.j_max + 1).min(dims.cols),
        )
    }

    /// Projects the camera's field of view onto the grid.
    ///
    /// The visible reach on each side of the observer is
    /// `altitude * tan(fov / 2)`, snapped to a whole number of cells, then
    /// clipped to the terrain extents before conversion to cell indices.
    pub fn from_observer(pose: &ObserverPose, fov_deg: f64, geometry: &GridGeometry) -> Footprint {
        let dims = geometry.dims();
        let half_fov = (fov_deg * 0.5).to_radians();
        let reach = pose.altitude * half_fov.tan();
        let reach = (reach / geometry.cell_size).round() * geometry.cell_size;

        let x_min = (pose.position.x - reach).clamp(0.0, geometry.extent_x);
        let x_max = (pose.position.x + reach).clamp(0.0, geometry.extent_x);
        let y_min = (pose.position.y - reach).clamp(0.0, geometry.extent_y);
        let y_max = (pose.position.y + reach).clamp(0.0, geometry.extent_y);

        if x_max <= x_min || y_max <= y_min {
            return Footprint::empty();
        }

        let to_index = |w: f64| (w / geometry.cell_size).round() as usize;
        Footprint::new(
            to_index(x_min).min(dims.rows),
            to_index(x_max).min(dims.rows),
            to_index(y_min).min(dims.cols),
            to_index(y_max).min(dims.cols),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> GridGeometry {
        GridGeometry::new(50.0, 50.0, 0.5)
    }

    #[test]
    fn dims_from_extents() {
        assert_eq!(geometry().dims(), GridDims::new(100, 100));
    }

    #[test]
    fn footprint_is_clipped_to_grid() {
        // Observer in the corner: half the nominal square falls outside and
        // must be clipped away.
        let pose = ObserverPose::new(0.0, 0.0, 10.0);
        let fp = Footprint::from_observer(&pose, 60.0, &geometry());
        assert_eq!(fp.i_min, 0);
        assert_eq!(fp.j_min, 0);
        assert!(fp.fits(geometry().dims()));
        assert!(!fp.is_empty());
    }

    #[test]
    fn footprint_is_centered_when_away_from_borders() {
        let pose = ObserverPose::new(25.0, 25.0, 5.0);
        let fp = Footprint::from_observer(&pose, 60.0, &geometry());
        // reach = 5 * tan(30 deg) = 2.886..., snapped to 3.0 world units.
        assert_eq!(fp.i_min, 44);
        assert_eq!(fp.i_max, 56);
        assert_eq!(fp.j_min, 44);
        assert_eq!(fp.j_max, 56);
    }

    #[test]
    fn zero_altitude_sees_nothing() {
        let pose = ObserverPose::new(25.0, 25.0, 0.0);
        let fp = Footprint::from_observer(&pose, 60.0, &geometry());
        assert!(fp.is_empty());
    }

    #[test]
    fn halo_clips_at_grid_edges() {
        let dims = GridDims::new(10, 10);
        let fp = Footprint::new(0, 3, 8, 10);
        let halo = fp.with_halo(dims);
        assert_eq!(halo, Footprint::new(0, 4, 7, 10));
    }
}
