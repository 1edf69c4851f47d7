// argus_sim/src/camera.rs

//! Observer kinematics and the synthetic sensing channel.
//!
//! The camera moves on a discrete action lattice: lateral steps of
//! `xy_step` and altitude steps of `h_step`, with the altitude held on
//! whole multiples of `h_step` so every visited altitude hits the same
//! calibration-table key.

use nalgebra::{DMatrix, Vector2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use argus_core::prelude::*;

/// The discrete action set. `Front`/`Back` move along +y/-y,
/// `Right`/`Left` along +x/-x, `Up`/`Down` change altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hover,
    Up,
    Down,
    Front,
    Back,
    Left,
    Right,
}

impl Action {
    /// Candidate order for planners; fixed so runs are reproducible.
    pub const ALL: [Action; 7] = [
        Action::Hover,
        Action::Up,
        Action::Down,
        Action::Front,
        Action::Back,
        Action::Left,
        Action::Right,
    ];
}

/// A UAV-mounted nadir camera over the terrain grid.
pub struct Camera {
    geometry: GridGeometry,
    fov_deg: f64,
    position: Vector2<f64>,
    /// Altitude is `alt_level * h_step`.
    alt_level: u32,
    xy_step: f64,
    h_step: f64,
    min_level: u32,
    max_level: u32,
}

impl Camera {
    pub fn new(geometry: GridGeometry, fov_deg: f64) -> Self {
        // Lateral step: a sixteenth of the smaller terrain extent; altitude
        // step: the height at which the footprint half-width equals one
        // lateral step.
        let min_extent = geometry.extent_x.min(geometry.extent_y);
        let xy_step = min_extent / 2.0 / 8.0;
        let h_step = xy_step / (fov_deg * 0.5).to_radians().tan();
        Self {
            geometry,
            fov_deg,
            position: Vector2::new(0.0, 0.0),
            alt_level: 1,
            xy_step,
            h_step,
            min_level: 1,
            max_level: 6,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn xy_step(&self) -> f64 {
        self.xy_step
    }

    pub fn h_step(&self) -> f64 {
        self.h_step
    }

    pub fn altitude(&self) -> f64 {
        self.h_step * f64::from(self.alt_level)
    }

    pub fn pose(&self) -> ObserverPose {
        ObserverPose {
            position: self.position,
            altitude: self.altitude(),
        }
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint_at(&self.pose())
    }

    pub fn footprint_at(&self, pose: &ObserverPose) -> Footprint {
        Footprint::from_observer(pose, self.fov_deg, &self.geometry)
    }

    /// The altitudes this camera can fly at, lowest first; the calibration
    /// table is built over exactly these.
    pub fn calibration_ladder(&self) -> Vec<f64> {
        (self.min_level..=self.max_level)
            .map(|level| self.h_step * f64::from(level))
            .collect()
    }

    pub fn is_permitted(&self, action: Action) -> bool {
        match action {
            Action::Hover => true,
            Action::Up => self.alt_level + 1 <= self.max_level,
            Action::Down => self.alt_level > self.min_level,
            Action::Front => self.position.y + self.xy_step <= self.geometry.extent_y,
            Action::Back => self.position.y - self.xy_step >= 0.0,
            Action::Right => self.position.x + self.xy_step <= self.geometry.extent_x,
            Action::Left => self.position.x - self.xy_step >= 0.0,
        }
    }

    /// Permitted actions in the fixed candidate order.
    pub fn permitted_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&a| self.is_permitted(a))
            .collect()
    }

    /// The pose after taking an action; a forbidden action hovers.
    pub fn future_pose(&self, action: Action) -> ObserverPose {
        if !self.is_permitted(action) {
            return self.pose();
        }
        let mut position = self.position;
        let mut level = self.alt_level;
        match action {
            Action::Hover => {}
            Action::Up => level += 1,
            Action::Down => level -= 1,
            Action::Front => position.y += self.xy_step,
            Action::Back => position.y -= self.xy_step,
            Action::Right => position.x += self.xy_step,
            Action::Left => position.x -= self.xy_step,
        }
        ObserverPose {
            position,
            altitude: self.h_step * f64::from(level),
        }
    }

    pub fn apply(&mut self, action: Action) {
        if !self.is_permitted(action) {
            return;
        }
        match action {
            Action::Hover => {}
            Action::Up => self.alt_level += 1,
            Action::Down => self.alt_level -= 1,
            Action::Front => self.position.y += self.xy_step,
            Action::Back => self.position.y -= self.xy_step,
            Action::Right => self.position.x += self.xy_step,
            Action::Left => self.position.x -= self.xy_step,
        }
    }

    /// Samples one noisy observation of the ground truth through the binary
    /// error channel: a truly occupied cell reads free with probability
    /// `s0`, a truly free cell reads occupied with probability `s1`.
    pub fn observe<R: Rng + ?Sized>(
        &self,
        truth: &DMatrix<u8>,
        error_rates: (f64, f64),
        rng: &mut R,
    ) -> Result<Observation, MapError> {
        let dims = self.geometry.dims();
        if truth.nrows() != dims.rows || truth.ncols() != dims.cols {
            return Err(MapError::ShapeMismatch {
                expected_rows: dims.rows,
                expected_cols: dims.cols,
                got_rows: truth.nrows(),
                got_cols: truth.ncols(),
            });
        }

        let fp = self.footprint();
        let (s0, s1) = error_rates;
        let values = DMatrix::from_fn(fp.rows(), fp.cols(), |r, c| {
            let cell = truth[(fp.i_min + r, fp.j_min + c)];
            let flip_probability = if cell == 1 { s0 } else { s1 };
            if rng.gen::<f64>() < flip_probability {
                1 - cell
            } else {
                cell
            }
        });
        Observation::new(fp, values, self.altitude())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn camera() -> Camera {
        Camera::new(GridGeometry::new(50.0, 50.0, 0.5), 60.0)
    }

    #[test]
    fn step_sizes_follow_the_geometry() {
        let cam = camera();
        assert_abs_diff_eq!(cam.xy_step(), 3.125, epsilon = 1e-12);
        // h_step = xy_step / tan(30 deg)
        assert_abs_diff_eq!(cam.h_step(), 3.125 / (30f64).to_radians().tan(), epsilon = 1e-9);
    }

    #[test]
    fn start_pose_cannot_descend_or_back_up() {
        let cam = camera();
        assert!(!cam.is_permitted(Action::Down));
        assert!(!cam.is_permitted(Action::Back));
        assert!(!cam.is_permitted(Action::Left));
        assert!(cam.is_permitted(Action::Up));
        assert!(cam.is_permitted(Action::Front));
        assert!(cam.permitted_actions().contains(&Action::Hover));
    }

    #[test]
    fn altitude_stays_on_the_ladder() {
        let mut cam = camera();
        let ladder = cam.calibration_ladder();
        assert_eq!(ladder.len(), 6);
        for _ in 0..10 {
            cam.apply(Action::Up);
        }
        // Clamped at the top of the band, and exactly a ladder rung.
        assert_abs_diff_eq!(cam.altitude(), ladder[5], epsilon = 0.0);
    }

    #[test]
    fn forbidden_action_hovers() {
        let cam = camera();
        let pose = cam.future_pose(Action::Back);
        assert_eq!(pose.position, cam.pose().position);
        assert_abs_diff_eq!(pose.altitude, cam.altitude(), epsilon = 0.0);
    }

    #[test]
    fn observation_matches_the_footprint_shape() {
        let cam = camera();
        let dims = cam.geometry().dims();
        let truth = DMatrix::from_element(dims.rows, dims.cols, 1u8);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let obs = cam.observe(&truth, (0.0, 0.0), &mut rng).unwrap();
        assert_eq!(obs.values.nrows(), obs.footprint.rows());
        // A noiseless channel reports the truth verbatim.
        assert!(obs.values.iter().all(|&z| z == 1));
    }

    #[test]
    fn wrong_truth_shape_is_rejected() {
        let cam = camera();
        let truth = DMatrix::from_element(10, 10, 0u8);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(cam.observe(&truth, (0.1, 0.1), &mut rng).is_err());
    }
}
