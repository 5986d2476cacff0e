//! One reporting tick of the Clutch simulation.
//!
//! [`run_tick`] wraps [`Cluster::step`] with the bookkeeping a driver needs
//! to render the tick:
//!
//! 1. **Step** -- metabolise, develop, and (after warm-up) pip every egg at
//!    the cluster's room temperature.
//! 2. **Record** -- store the elapsed real time for every egg that started
//!    pipping for the first time.
//! 3. **Observe** -- snapshot every egg and summarise the cluster.
//!
//! The tick is deterministic given the same cluster state and random draws;
//! only the recorded wall-clock durations depend on `now`.

use chrono::{DateTime, Utc};
use clutch_embryo::RandomSource;
use clutch_types::{ClusterSummary, EggId, EggSnapshot, FirstPipRecord};
use tracing::info;

use crate::clock::{ClockError, delta_seconds};
use crate::cluster::{Cluster, ClusterError};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The cluster step failed.
    #[error("cluster error: {source}")]
    Cluster {
        /// The underlying cluster error.
        #[from]
        source: ClusterError,
    },

    /// Recording a first pip failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Everything a driver needs to render one tick.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The iteration that was executed.
    pub iteration: u64,
    /// Temperature the tick ran at.
    pub temperature: f64,
    /// Cluster aggregate after the tick.
    pub summary: ClusterSummary,
    /// Per-egg snapshots after the tick, in cluster order.
    pub snapshots: Vec<EggSnapshot>,
    /// Eggs that went from not pipping to pipping this tick.
    pub pip_onsets: Vec<EggId>,
    /// Eggs whose first-ever pip was recorded this tick.
    pub new_first_pips: Vec<FirstPipRecord>,
    /// Every first pip recorded so far.
    pub first_pips: Vec<FirstPipRecord>,
}

/// Run one tick at the cluster's room temperature.
pub fn run_tick(
    cluster: &mut Cluster,
    rng: &mut impl RandomSource,
    now: DateTime<Utc>,
) -> Result<TickSummary, TickError> {
    let temperature = cluster.room_temperature();
    run_tick_at(cluster, temperature, rng, now)
}

/// Run one tick at an explicit `temperature`.
pub fn run_tick_at(
    cluster: &mut Cluster,
    temperature: f64,
    rng: &mut impl RandomSource,
    now: DateTime<Utc>,
) -> Result<TickSummary, TickError> {
    // 1. Step.
    let outcome = cluster.step(temperature, rng)?;

    // 2. Record first pips.
    let mut new_first_pips = Vec::new();
    for &egg in &outcome.pip_onsets {
        if cluster.clock_mut().record_first_pip(egg, now)? {
            let elapsed = cluster.clock().first_pip(egg).map_or(0.0, delta_seconds);
            info!(
                egg = %egg,
                iteration = outcome.iteration,
                elapsed_seconds = elapsed,
                "First pip recorded"
            );
            new_first_pips.push(FirstPipRecord {
                egg,
                elapsed_seconds: elapsed,
            });
        }
    }

    // 3. Observe.
    Ok(TickSummary {
        iteration: outcome.iteration,
        temperature,
        summary: cluster.summary(),
        snapshots: cluster.snapshots(),
        pip_onsets: outcome.pip_onsets,
        new_first_pips,
        first_pips: cluster.clock().first_pip_records(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use clutch_embryo::{Egg, ScriptedSource};

    use super::*;
    use crate::cluster::ClusterSettings;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn ripe_cluster() -> Cluster {
        let eggs = (0..3)
            .map(|index| Egg::from_parts(EggId::new(index), 30.0, 1.0, 0.5, 60.0, 1.5))
            .collect();
        Cluster::from_eggs(eggs, 30.0, ClusterSettings::default(), start()).unwrap()
    }

    #[test]
    fn summary_carries_the_executed_iteration() {
        let mut cluster = ripe_cluster();
        let mut rng = ScriptedSource::constant(0.0);
        let first = run_tick(&mut cluster, &mut rng, start()).unwrap();
        assert_eq!(first.iteration, 0);
        assert_eq!(first.summary.iteration, 0);
        assert_eq!(first.snapshots.len(), 3);
        assert!((first.temperature - 30.0).abs() < f64::EPSILON);

        let second = run_tick(&mut cluster, &mut rng, start()).unwrap();
        assert_eq!(second.iteration, 1);
        assert_eq!(cluster.iteration(), 2);
    }

    #[test]
    fn first_pips_recorded_once() {
        let mut cluster = ripe_cluster();
        let mut rng = ScriptedSource::constant(0.9);

        for _ in 0..6 {
            let tick = run_tick(&mut cluster, &mut rng, start()).unwrap();
            assert!(tick.new_first_pips.is_empty());
            assert!(tick.first_pips.is_empty());
        }

        let pip_time = start() + TimeDelta::seconds(3);
        let tick = run_tick(&mut cluster, &mut rng, pip_time).unwrap();
        assert_eq!(tick.iteration, 6);
        assert_eq!(tick.pip_onsets.len(), 3);
        assert_eq!(tick.new_first_pips.len(), 3);
        assert!(
            tick.new_first_pips
                .iter()
                .all(|record| (record.elapsed_seconds - 3.0).abs() < 1e-9)
        );

        let later = start() + TimeDelta::seconds(10);
        let tick = run_tick(&mut cluster, &mut rng, later).unwrap();
        assert!(tick.new_first_pips.is_empty());
        assert_eq!(tick.first_pips.len(), 3);
        assert!(
            tick.first_pips
                .iter()
                .all(|record| (record.elapsed_seconds - 3.0).abs() < 1e-9)
        );
    }

    #[test]
    fn explicit_temperature_is_used() {
        let mut cluster = ripe_cluster();
        let mut rng = ScriptedSource::constant(0.0);
        let tick = run_tick_at(&mut cluster, 25.0, &mut rng, start()).unwrap();
        assert!((tick.temperature - 25.0).abs() < f64::EPSILON);
        assert!((tick.summary.room_temperature - 30.0).abs() < f64::EPSILON);
    }
}
