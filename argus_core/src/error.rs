// argus_core/src/error.rs

use thiserror::Error;

/// Failure taxonomy of the inference core.
///
/// Everything here is a configuration-level fault: the calling loop decides
/// whether to abort the run. Probability-range violations are NOT modelled as
/// errors; they indicate a defect in the potential or normalization code and
/// fail fast via `assert!`.
#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    /// An observation matrix does not match the shape of its footprint, or a
    /// marginal field does not match the belief grid.
    #[error("shape mismatch: expected {expected_rows}x{expected_cols}, got {got_rows}x{got_cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        got_rows: usize,
        got_cols: usize,
    },

    /// A footprint rectangle reaches outside the belief grid.
    #[error(
        "footprint [{i_min}, {i_max}) x [{j_min}, {j_max}) exceeds grid {rows}x{cols}"
    )]
    FootprintOutOfBounds {
        i_min: usize,
        i_max: usize,
        j_min: usize,
        j_max: usize,
        rows: usize,
        cols: usize,
    },

    /// A calibrated sensor was asked about an altitude that was never
    /// calibrated.
    #[error("no calibration entry for altitude {0}")]
    UnknownAltitude(f64),

    /// The adaptive pairwise potential needs the most recent observation and
    /// none was supplied.
    #[error("adaptive potential requires the most recent observation")]
    MissingObservation,
}
