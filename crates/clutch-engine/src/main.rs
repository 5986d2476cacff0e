//! Driver binary for the Clutch simulation.
//!
//! This is the main entry point that wires together configuration, the egg
//! cluster, step pacing, and the console report. It runs the simulation
//! loop until the operator quits, the tick limit is hit, or every egg has
//! hatched.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `clutch-config.yaml` (or `CLUTCH_CONFIG`)
//! 2. Initialize structured logging (tracing) on stderr
//! 3. Seed the random source
//! 4. Create the cluster from the seed stages
//! 5. Choose the step trigger (operator prompt or fixed interval)
//! 6. Run the simulation loop, printing a report per tick
//! 7. Log the result

mod error;
mod render;
mod trigger;

use std::path::PathBuf;

use chrono::Utc;
use clutch_core::cluster::Cluster;
use clutch_core::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ReportFormat, SimulationConfig};
use clutch_core::runner::{self, IntervalTrigger, StepTrigger};
use clutch_embryo::RngSource;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::render::ReportRenderer;
use crate::trigger::PromptTrigger;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!(source = %config_source, "clutch-engine starting");
    info!(
        room_temperature = config.incubation.room_temperature,
        egg_count = config.incubation.seed_stages.len(),
        seed = ?config.incubation.seed,
        warmup_iterations = config.incubation.warmup_iterations,
        coupling = ?config.incubation.coupling,
        "Configuration loaded"
    );

    // 3. Seed the random source.
    let std_rng = match config.incubation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut rng = RngSource::new(std_rng);

    // 4. Create the cluster.
    let mut cluster = Cluster::new(
        &config.incubation.seed_stages,
        config.incubation.room_temperature,
        config.cluster_settings(),
        &mut rng,
        Utc::now(),
    )
    .map_err(EngineError::from)?;

    // 5. Choose the step trigger.
    let bounds = &config.simulation;
    let mut trigger: Box<dyn StepTrigger> = if bounds.interactive {
        Box::new(PromptTrigger::new(std::io::stdin().lock(), std::io::stdout()))
    } else {
        Box::new(IntervalTrigger::from_millis(bounds.tick_interval_ms))
    };
    info!(
        interactive = bounds.interactive,
        tick_interval_ms = bounds.tick_interval_ms,
        max_ticks = bounds.max_ticks,
        "Step trigger ready"
    );

    let mut renderer = ReportRenderer::new(std::io::stdout(), config.logging.report_format);

    // 6. Run the simulation.
    let result = runner::run_simulation(
        &mut cluster,
        &mut rng,
        bounds,
        trigger.as_mut(),
        &mut renderer,
    )
    .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "clutch-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration.
///
/// Reads the file named by `CLUTCH_CONFIG`, falling back to
/// `clutch-config.yaml` in the working directory. A missing default file
/// means the reference scenario; a missing explicit file is an error.
/// Returns the config and a description of where it came from.
fn load_config() -> Result<(SimulationConfig, String), EngineError> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let required = explicit.is_some();
    let path = explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if required || path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, "defaults".to_owned()))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level. JSON reports get JSON logs so both streams stay machine-readable.
fn init_tracing(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match config.logging.report_format {
        ReportFormat::Json => builder.json().init(),
        ReportFormat::Text => builder.init(),
    }
}
