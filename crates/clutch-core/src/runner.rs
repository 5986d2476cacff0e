//! Simulation loop runner.
//!
//! This module provides [`run_simulation`], the synchronous loop that
//! drives ticks with support for:
//!
//! - **Operator pacing**: a [`StepTrigger`] decides when each tick runs
//!   (an interactive "next step" prompt, a fixed interval, or a test stub)
//!   and may stop the run
//! - **Bounded runs**: stop after `max_ticks`
//! - **Natural end**: stop once every egg has hatched
//! - **Observation**: a [`TickCallback`] receives every [`TickSummary`]
//!
//! There is no background execution: each tick runs to completion on the
//! calling thread before the trigger is consulted again.

use std::time::Duration;

use chrono::Utc;
use clutch_embryo::RandomSource;
use tracing::{info, warn};

use crate::cluster::Cluster;
use crate::config::SimulationBoundsConfig;
use crate::tick::{self, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Every egg hatched.
    AllHatched,
    /// The step trigger asked to stop.
    OperatorStop,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// What a [`StepTrigger`] wants the runner to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSignal {
    /// Run the next tick.
    Step,
    /// End the run.
    Stop,
}

/// Decides when the next tick runs.
pub trait StepTrigger {
    /// Block until the next tick should run, or ask to stop.
    fn wait_for_step(&mut self) -> StepSignal;
}

/// Runs ticks back to back with a fixed pause between them.
#[derive(Debug, Clone)]
pub struct IntervalTrigger {
    interval: Duration,
    first: bool,
}

impl IntervalTrigger {
    /// Pause `interval_ms` milliseconds between ticks (0 = no pause).
    pub const fn from_millis(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            first: true,
        }
    }
}

impl StepTrigger for IntervalTrigger {
    fn wait_for_step(&mut self) -> StepSignal {
        if self.first {
            self.first = false;
        } else if !self.interval.is_zero() {
            std::thread::sleep(self.interval);
        }
        StepSignal::Step
    }
}

/// Callback invoked after each tick completes.
///
/// Renderers implement this to draw or print the tick.
pub trait TickCallback {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Arguments
///
/// * `cluster` - The egg cluster, stepped at its room temperature
/// * `rng` - Source of pipping draws
/// * `bounds` - Tick limit and natural-end settings
/// * `trigger` - Decides when each tick runs
/// * `callback` - Called after each tick for rendering
pub fn run_simulation(
    cluster: &mut Cluster,
    rng: &mut impl RandomSource,
    bounds: &SimulationBoundsConfig,
    trigger: &mut dyn StepTrigger,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        stop_when_all_hatched = bounds.stop_when_all_hatched,
        egg_count = cluster.eggs().len(),
        room_temperature = cluster.room_temperature(),
        "Simulation starting"
    );

    loop {
        // --- Check tick limit (before waiting on the trigger) ---
        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(max_ticks = bounds.max_ticks, "Tick limit reached");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Wait for the trigger ---
        if trigger.wait_for_step() == StepSignal::Stop {
            info!("Operator stop requested");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::OperatorStop,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Execute tick ---
        let summary = tick::run_tick(cluster, rng, Utc::now())?;
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary);

        // --- Check natural end ---
        if bounds.stop_when_all_hatched && summary.summary.all_hatched() {
            info!(iteration = summary.iteration, "All eggs hatched");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::AllHatched,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_iteration = result.final_summary.as_ref().map(|s| s.iteration),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            iteration = summary.iteration,
            mean_stage = summary.summary.mean_stage,
            week_estimate = summary.summary.week_estimate,
            hatched = summary.summary.hatched_count,
            eggs = summary.summary.egg_count,
            "Final tick summary"
        );
        for record in &summary.first_pips {
            info!(
                egg = %record.egg,
                elapsed_seconds = record.elapsed_seconds,
                "Time to first pip"
            );
        }
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}
