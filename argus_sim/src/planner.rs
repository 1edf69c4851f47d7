// argus_sim/src/planner.rs

//! Action selection over the camera's discrete action set. The planner only
//! reads belief; it never writes inference state.

use std::fmt;

use nalgebra::DMatrix;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::camera::{Action, Camera};
use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Uniformly random over the permitted actions.
    Random,
    /// Serpentine traversal of the terrain at constant altitude.
    Sweep,
    /// Greedy one-step information gain: fly where the belief is most
    /// uncertain.
    #[serde(rename = "ig")]
    InfoGain,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Random => write!(f, "random"),
            Strategy::Sweep => write!(f, "sweep"),
            Strategy::InfoGain => write!(f, "ig"),
        }
    }
}

pub struct Planner {
    strategy: Strategy,
    sweep_forward: bool,
}

impl Planner {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            sweep_forward: true,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn select_action<R: Rng + ?Sized>(
        &mut self,
        camera: &Camera,
        belief: &DMatrix<f64>,
        rng: &mut R,
    ) -> Action {
        match self.strategy {
            Strategy::Random => {
                let permitted = camera.permitted_actions();
                permitted[rng.gen_range(0..permitted.len())]
            }
            Strategy::Sweep => self.sweep(camera),
            Strategy::InfoGain => Self::information_gain(camera, belief),
        }
    }

    /// Lawnmower pattern: run the column, shift one lane at the turn.
    fn sweep(&mut self, camera: &Camera) -> Action {
        let ahead = if self.sweep_forward {
            Action::Front
        } else {
            Action::Back
        };
        if camera.is_permitted(ahead) {
            ahead
        } else if camera.is_permitted(Action::Right) {
            self.sweep_forward = !self.sweep_forward;
            Action::Right
        } else {
            Action::Hover
        }
    }

    /// Scores every permitted action by the entropy mass inside the
    /// footprint it would observe from, and takes the best. Candidates are
    /// visited in the fixed action order, so ties resolve deterministically.
    fn information_gain(camera: &Camera, belief: &DMatrix<f64>) -> Action {
        let mut best = Action::Hover;
        let mut best_score = f64::NEG_INFINITY;
        for action in camera.permitted_actions() {
            let pose = camera.future_pose(action);
            let fp = camera.footprint_at(&pose);
            let mut score = 0.0;
            for j in fp.j_min..fp.j_max {
                for i in fp.i_min..fp.i_max {
                    score += metrics::binary_entropy(belief[(i, j)]);
                }
            }
            if score > best_score {
                best_score = score;
                best = action;
            }
        }
        best
    }
}
