// argus_core/src/mapping/windowed.rs

//! Footprint-localized loopy belief propagation.
//!
//! Message passing is restricted to the rectangle a single observation
//! touched (plus the one-cell halo the slice shifts reach), so the per-step
//! cost scales with the footprint, not the grid. The accumulated prior of
//! unobserved-but-adjacent cells still enters the window through the belief
//! channel, which is reseeded from the belief grid at the start of every
//! call.

use std::ops::Range;

use nalgebra::DMatrix;

use crate::error::MapError;
use crate::footprint::Footprint;
use crate::grid::BeliefMap;
use crate::mapping::{validate_observation, OccupancyMapper};
use crate::messages::Observation;
use crate::models::potential::PairwisePotential;
use crate::models::sensor::{Evidence, EvidenceModel};
use crate::types::GridDims;
use crate::utils::normalize;

/// Four directional channels plus the belief channel.
const CHANNELS: usize = 5;

/// Channel 4 mirrors the belief. It is overwritten before each propagation
/// call and never touched by a directional pass.
const BELIEF_CHANNEL: usize = 4;

/// The direction a message flows during one pass. The discriminant is the
/// channel that pass writes: a cell's channel `d` holds the message that
/// last arrived flowing in direction `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down = 0,
    Left = 1,
    Up = 2,
    Right = 3,
}

impl Direction {
    /// Pass order within one iteration. Passes are synchronous (reads come
    /// from the front buffer only), so the order cannot change the result;
    /// it is still fixed for reproducibility.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn channel(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
        }
    }
}

/// Explicit index ranges for one directional pass over one footprint.
///
/// The product region is always the footprint itself; the plan adds which
/// channel the BP exclusion rule removes from the product, which
/// sub-rectangle of the footprint-local result survives (the outward-facing
/// edge is trimmed at grid borders, where no receiving neighbor exists), and
/// the destination rectangle in grid coordinates, shifted one cell along the
/// flow and clamped to the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SlicePlan {
    excluded_channel: usize,
    write_channel: usize,
    read_rows: Range<usize>,
    read_cols: Range<usize>,
    write_rows: Range<usize>,
    write_cols: Range<usize>,
}

impl SlicePlan {
    fn for_direction(direction: Direction, fp: &Footprint, dims: GridDims) -> SlicePlan {
        let (h, w) = (fp.rows(), fp.cols());
        // A cell must not echo back what the receiver itself sent: exclude
        // the opposite flow's channel from the product.
        let excluded_channel = direction.opposite().channel();
        let write_channel = direction.channel();
        match direction {
            Direction::Up => SlicePlan {
                excluded_channel,
                write_channel,
                read_rows: usize::from(fp.i_min == 0)..h,
                read_cols: 0..w,
                write_rows: fp.i_min.saturating_sub(1)..fp.i_max - 1,
                write_cols: fp.j_min..fp.j_max,
            },
            Direction::Down => SlicePlan {
                excluded_channel,
                write_channel,
                read_rows: 0..if fp.i_max == dims.rows { h - 1 } else { h },
                read_cols: 0..w,
                write_rows: fp.i_min + 1..(fp.i_max + 1).min(dims.rows),
                write_cols: fp.j_min..fp.j_max,
            },
            Direction::Left => SlicePlan {
                excluded_channel,
                write_channel,
                read_rows: 0..h,
                read_cols: usize::from(fp.j_min == 0)..w,
                write_rows: fp.i_min..fp.i_max,
                write_cols: fp.j_min.saturating_sub(1)..fp.j_max - 1,
            },
            Direction::Right => SlicePlan {
                excluded_channel,
                write_channel,
                read_rows: 0..h,
                read_cols: 0..if fp.j_max == dims.cols { w - 1 } else { w },
                write_rows: fp.i_min..fp.i_max,
                write_cols: fp.j_min + 1..(fp.j_max + 1).min(dims.cols),
            },
        }
    }
}

/// The windowed engine. Owns the persistent belief grid and the two
/// ephemeral message buffers (front and back, for synchronous passes).
pub struct WindowedLbpMapper {
    dims: GridDims,
    max_iterations: usize,
    belief: BeliefMap,
    msgs: [DMatrix<f64>; CHANNELS],
    buffer: [DMatrix<f64>; CHANNELS],
}

impl WindowedLbpMapper {
    pub fn new(dims: GridDims, max_iterations: usize) -> Self {
        let plane = || DMatrix::from_element(dims.rows, dims.cols, 0.5);
        Self {
            dims,
            max_iterations,
            belief: BeliefMap::uniform(dims),
            msgs: [plane(), plane(), plane(), plane(), plane()],
            buffer: [plane(), plane(), plane(), plane(), plane()],
        }
    }

    pub fn belief_map(&self) -> &BeliefMap {
        &self.belief
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Bayes-fuses the per-cell likelihoods with the accumulated prior over
    /// the footprint. `BeliefMap::set` asserts the `[0, 1]` invariant.
    fn fuse_evidence(&mut self, fp: &Footprint, evidence: &Evidence) {
        for c in 0..fp.cols() {
            for r in 0..fp.rows() {
                let (i, j) = (fp.i_min + r, fp.j_min + c);
                let prior = self.belief.get(i, j);
                let occupied = evidence.occupied[(r, c)] * prior;
                let free = evidence.free[(r, c)] * (1.0 - prior);
                self.belief
                    .set(i, j, normalize::occupied_fraction(free, occupied));
            }
        }
    }

    /// Messages are per-step working state: every directional channel
    /// restarts from the uniform prior and the belief channel reseeds from
    /// the belief grid. In-progress convergence is intentionally not carried
    /// across observation steps.
    fn reset_messages(&mut self) {
        for ch in 0..BELIEF_CHANNEL {
            self.msgs[ch].fill(0.5);
            self.buffer[ch].fill(0.5);
        }
        self.msgs[BELIEF_CHANNEL].copy_from(self.belief.values());
    }

    /// One synchronous directional pass: reads `msgs`, writes `buffer`.
    fn directional_pass(&mut self, plan: &SlicePlan, fp: &Footprint, psi: &PairwisePotential) {
        let (h, w) = (fp.rows(), fp.cols());

        // Elementwise product of the selected channels over the footprint:
        // the three other directions plus the belief channel.
        let mut mul_free = DMatrix::from_element(h, w, 1.0);
        let mut mul_occ = DMatrix::from_element(h, w, 1.0);
        for ch in 0..CHANNELS {
            if ch == plan.excluded_channel {
                continue;
            }
            for c in 0..w {
                for r in 0..h {
                    let m = self.msgs[ch][(fp.i_min + r, fp.j_min + c)];
                    mul_free[(r, c)] *= 1.0 - m;
                    mul_occ[(r, c)] *= m;
                }
            }
        }

        debug_assert_eq!(plan.read_rows.len(), plan.write_rows.len());
        debug_assert_eq!(plan.read_cols.len(), plan.write_cols.len());

        let psi = psi.matrix();
        for dc in 0..plan.read_cols.len() {
            for dr in 0..plan.read_rows.len() {
                let (r, c) = (plan.read_rows.start + dr, plan.read_cols.start + dc);
                // 2x2 linear map, then collapse to the occupied scalar.
                let msg_free = psi[(0, 0)] * mul_free[(r, c)] + psi[(0, 1)] * mul_occ[(r, c)];
                let msg_occ = psi[(1, 0)] * mul_free[(r, c)] + psi[(1, 1)] * mul_occ[(r, c)];
                self.buffer[plan.write_channel]
                    [(plan.write_rows.start + dr, plan.write_cols.start + dc)] =
                    normalize::occupied_fraction(msg_free, msg_occ);
            }
        }
    }

    /// Publishes the buffered directional channels. Only the halo region can
    /// differ from the front buffer, so the copy stays footprint-local.
    fn commit_pass(&mut self, halo: &Footprint) {
        for ch in 0..BELIEF_CHANNEL {
            for j in halo.j_min..halo.j_max {
                for i in halo.i_min..halo.i_max {
                    self.msgs[ch][(i, j)] = self.buffer[ch][(i, j)];
                }
            }
        }
    }

    /// Collapses all five channels into the belief over the footprint.
    fn extract_belief(&mut self, fp: &Footprint) {
        for j in fp.j_min..fp.j_max {
            for i in fp.i_min..fp.i_max {
                let mut bel_free = 1.0;
                let mut bel_occ = 1.0;
                for ch in 0..CHANNELS {
                    let m = self.msgs[ch][(i, j)];
                    bel_free *= 1.0 - m;
                    bel_occ *= m;
                }
                self.belief
                    .set(i, j, normalize::occupied_fraction(bel_free, bel_occ));
            }
        }
    }
}

impl OccupancyMapper for WindowedLbpMapper {
    fn integrate(
        &mut self,
        observation: &Observation,
        evidence_model: &dyn EvidenceModel,
        potential: &PairwisePotential,
    ) -> Result<(), MapError> {
        validate_observation(observation, self.dims)?;
        let fp = observation.footprint;
        if fp.is_empty() {
            return Ok(());
        }

        let evidence = evidence_model.evidence(&observation.values, observation.altitude)?;
        self.fuse_evidence(&fp, &evidence);
        self.reset_messages();

        let halo = fp.with_halo(self.dims);
        let plans: Vec<SlicePlan> = Direction::ALL
            .iter()
            .map(|&d| SlicePlan::for_direction(d, &fp, self.dims))
            .collect();

        for _ in 0..self.max_iterations {
            for plan in &plans {
                self.directional_pass(plan, &fp, potential);
            }
            self.commit_pass(&halo);
        }

        self.extract_belief(&fp);
        Ok(())
    }

    fn belief(&self) -> &DMatrix<f64> {
        self.belief.values()
    }

    fn dims(&self) -> GridDims {
        self.dims
    }
}
