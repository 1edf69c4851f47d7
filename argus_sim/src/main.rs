// argus_sim/src/main.rs

//! Headless survey runner: observe -> infer -> plan -> act, once per step,
//! logging metrics along the way. All randomness flows from one seeded
//! generator, so a scenario re-runs bit-for-bit.

mod camera;
mod cli;
mod config;
mod logger;
mod metrics;
mod planner;
mod terrain;

use std::collections::HashSet;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use argus_core::prelude::*;

use camera::Camera;
use cli::Cli;
use config::{load_scenario, EngineKind, ScenarioConfig};
use logger::RunLogger;
use planner::Planner;

#[derive(Debug, Error)]
enum SimError {
    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),
    #[error("failed to render scenario header: {0}")]
    Header(#[from] toml::ser::Error),
    #[error("run log: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Map(#[from] MapError),
}

fn main() -> Result<(), SimError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut scenario = load_scenario(&cli.scenario)?;
    if let Some(steps) = cli.steps {
        scenario.run.steps = steps;
    }
    if let Some(seed) = cli.seed {
        scenario.run.seed = seed;
    }
    run(&scenario)
}

fn run(scenario: &ScenarioConfig) -> Result<(), SimError> {
    let geometry = GridGeometry::new(
        scenario.grid.extent_x,
        scenario.grid.extent_y,
        scenario.grid.cell_size,
    );
    let dims = geometry.dims();
    let mut rng = ChaCha8Rng::seed_from_u64(scenario.run.seed);

    let truth = terrain::correlated_binary_field(dims, scenario.terrain.cluster_radius, &mut rng);
    let mut camera = Camera::new(geometry, scenario.sensor.fov_deg);
    let params = SensorParams {
        a: scenario.sensor.a,
        b: scenario.sensor.b,
    };

    // Sensor model: the closed form, or rates calibrated once over the
    // camera's altitude ladder and read-only for the rest of the run.
    let (evidence_model, table): (Box<dyn EvidenceModel>, Option<CalibrationTable>) =
        if scenario.sensor.calibrated {
            let estimator = CalibrationEstimator::new(params);
            let ladder = camera.calibration_ladder();
            let table = estimator.build_table(&ladder, scenario.sensor.margin_of_error, &mut rng);
            info!(entries = table.len(), "calibration table built");
            (Box::new(CalibratedSensor::new(table.clone())), Some(table))
        } else {
            (Box::new(ClosedFormSensor::new(params)), None)
        };

    let mut mapper: Box<dyn OccupancyMapper> = match scenario.inference.engine {
        EngineKind::Windowed => {
            Box::new(WindowedLbpMapper::new(dims, scenario.inference.iterations))
        }
        EngineKind::Dense => Box::new(DenseLbpMapper::new(dims, scenario.inference.iterations)),
    };

    let mut planner = Planner::new(scenario.run.strategy);
    let log_path = scenario.run.log_dir.join(format!(
        "{}_{}_{}.txt",
        planner.strategy(),
        config::potential_name(scenario.inference.potential),
        scenario.inference.engine,
    ));
    let header = format!(
        "# argus survey\n# grid: {}x{} cells of {}\n# initial pose: ({}, {}) at {:.2}\n{}",
        dims.rows,
        dims.cols,
        geometry.cell_size,
        camera.pose().position.x,
        camera.pose().position.y,
        camera.altitude(),
        toml::to_string_pretty(scenario)?,
    );
    let mut logger = RunLogger::create(&log_path, &header)?;
    info!(log = %log_path.display(), steps = scenario.run.steps, "survey started");

    let mut observed: HashSet<(usize, usize)> = HashSet::new();
    let mut actions: Vec<camera::Action> = Vec::new();

    for step in 0..=scenario.run.steps {
        // Observe.
        let rates = error_rates(&params, table.as_ref(), camera.altitude())?;
        let observation = camera.observe(&truth, rates, &mut rng)?;

        // Infer: potential from the freshest observation, then one engine
        // invocation.
        let potential =
            PairwisePotential::compute(scenario.inference.potential, Some(&observation.values))?;
        mapper.integrate(&observation, evidence_model.as_ref(), &potential)?;

        // Metrics and logging.
        let fp = observation.footprint;
        for i in fp.i_min..fp.i_max {
            for j in fp.j_min..fp.j_max {
                observed.insert((i, j));
            }
        }
        let entropy = metrics::entropy(mapper.belief());
        let mse = metrics::mse(&truth, mapper.belief());
        let coverage = metrics::coverage(observed.len(), dims);
        logger.log_step(entropy, mse, camera.altitude(), coverage)?;
        info!(
            step,
            entropy = format_args!("{:.2}", entropy),
            mse = format_args!("{:.4}", mse),
            coverage = format_args!("{:.4}", coverage),
            altitude = format_args!("{:.2}", camera.altitude()),
            "observation integrated"
        );

        if step == scenario.run.steps {
            break;
        }

        // Plan and act.
        let action = planner.select_action(&camera, mapper.belief(), &mut rng);
        camera.apply(action);
        actions.push(action);
    }

    logger.note(&format!("actions: {:?}", actions))?;
    info!("survey finished");
    Ok(())
}

fn error_rates(
    params: &SensorParams,
    table: Option<&CalibrationTable>,
    altitude: f64,
) -> Result<(f64, f64), MapError> {
    match table {
        Some(table) => table
            .lookup(altitude)
            .ok_or(MapError::UnknownAltitude(altitude)),
        None => {
            let sigma = params.sigma(altitude);
            Ok((sigma, sigma))
        }
    }
}
