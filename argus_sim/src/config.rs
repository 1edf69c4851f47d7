// argus_sim/src/config.rs

//! Scenario configuration: the root of the data parsed from a scenario TOML
//! file. Every section has defaults, so an empty (or missing) file runs a
//! sensible survey.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use argus_core::models::potential::PotentialMode;

use crate::planner::Strategy;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our structs
pub struct ScenarioConfig {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub grid: GridSection,

    #[serde(default)]
    pub sensor: SensorSection,

    #[serde(default)]
    pub inference: InferenceSection,

    #[serde(default)]
    pub terrain: TerrainSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Number of observation steps (the initial observation is step 0).
    pub steps: usize,
    /// Seed for the run's pseudo-random number generator.
    pub seed: u64,
    /// Action-selection strategy.
    pub strategy: Strategy,
    /// Directory the per-step metrics file is written into.
    pub log_dir: PathBuf,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            steps: 50,
            seed: 123,
            strategy: Strategy::InfoGain,
            log_dir: "runs".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSection {
    /// Terrain extents in world units; x maps to grid rows, y to columns.
    pub extent_x: f64,
    pub extent_y: f64,
    /// Edge length of one square grid cell, world units.
    pub cell_size: f64,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            extent_x: 50.0,
            extent_y: 50.0,
            cell_size: 0.5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorSection {
    /// Error-curve parameters: `sigma(h) = a * (1 - exp(-b * h))`.
    pub a: f64,
    pub b: f64,
    /// Camera field of view, degrees.
    pub fov_deg: f64,
    /// Use the Monte-Carlo calibration table instead of the closed form.
    pub calibrated: bool,
    /// Target margin of error for the calibration sample-size formula.
    pub margin_of_error: f64,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.015,
            fov_deg: 60.0,
            calibrated: false,
            margin_of_error: 0.02,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceSection {
    /// Which belief-propagation engine integrates observations.
    pub engine: EngineKind,
    /// Fixed iteration budget per observation step.
    pub iterations: usize,
    /// Pairwise potential mode.
    pub potential: PotentialMode,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            engine: EngineKind::Windowed,
            iterations: 5,
            potential: PotentialMode::Adaptive,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerrainSection {
    /// Smoothing radius of the synthetic ground truth, in cells.
    pub cluster_radius: usize,
}

impl Default for TerrainSection {
    fn default() -> Self {
        Self { cluster_radius: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Windowed,
    Dense,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Windowed => write!(f, "windowed"),
            EngineKind::Dense => write!(f, "dense"),
        }
    }
}

/// Short name of a potential mode, for log paths and headers.
pub fn potential_name(mode: PotentialMode) -> &'static str {
    match mode {
        PotentialMode::Equal => "equal",
        PotentialMode::Biased => "biased",
        PotentialMode::Adaptive => "adaptive",
    }
}

/// Loads a scenario file. A missing file yields the default scenario; a
/// present-but-invalid file is an error.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, figment::Error> {
    Figment::new().merge(Toml::file(path)).extract()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scenario_uses_defaults() {
        let config: ScenarioConfig = Figment::new()
            .merge(Toml::string(""))
            .extract()
            .expect("empty scenario should parse");
        assert_eq!(config.run.steps, 50);
        assert_eq!(config.inference.engine, EngineKind::Windowed);
        assert_eq!(config.inference.potential, PotentialMode::Adaptive);
    }

    #[test]
    fn sections_override_independently() {
        let config: ScenarioConfig = Figment::new()
            .merge(Toml::string(
                r#"
                [run]
                steps = 10
                seed = 7
                strategy = "sweep"
                log_dir = "out"

                [inference]
                engine = "dense"
                iterations = 3
                potential = "biased"
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.run.steps, 10);
        assert_eq!(config.run.strategy, Strategy::Sweep);
        assert_eq!(config.inference.engine, EngineKind::Dense);
        assert_eq!(config.inference.iterations, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.grid.cell_size, 0.5);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ScenarioConfig, _> = Figment::new()
            .merge(Toml::string("[run]\nstepz = 10"))
            .extract();
        assert!(result.is_err());
    }
}
