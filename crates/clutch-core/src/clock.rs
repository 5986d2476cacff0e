//! Simulation clock for the Clutch simulation.
//!
//! The clock is the single source of truth for temporal state: the
//! iteration counter and the wall-clock instant the cluster was created.
//! It also keeps, per egg, the real time that elapsed before the egg first
//! pipped.
//!
//! # Design Principles
//!
//! - The iteration counter uses checked arithmetic (no silent overflow).
//! - `started_at` is fixed at creation.
//! - Each egg's first-pip slot is written at most once; later pips never
//!   overwrite it.

use chrono::{DateTime, TimeDelta, Utc};
use clutch_types::{EggId, FirstPipRecord};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Iteration counter would overflow.
    #[error("iteration counter overflow: cannot advance beyond u64::MAX")]
    IterationOverflow,

    /// The egg does not belong to the cluster this clock tracks.
    #[error("unknown egg {egg}: clock tracks {egg_count} eggs")]
    UnknownEgg {
        /// The egg that was referenced.
        egg: EggId,
        /// Number of eggs the clock was created for.
        egg_count: usize,
    },
}

/// Iteration counter plus per-egg time-to-first-pip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationClock {
    /// Number of completed ticks (0 before the first tick).
    iteration: u64,

    /// When the cluster was created.
    started_at: DateTime<Utc>,

    /// Elapsed time to first pip, indexed by egg.
    first_pips: Vec<Option<TimeDelta>>,
}

impl SimulationClock {
    /// Create a clock for `egg_count` eggs starting at `started_at`.
    pub fn new(egg_count: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            iteration: 0,
            started_at,
            first_pips: vec![None; egg_count],
        }
    }

    /// Advance the iteration counter by one. Returns the new value.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.iteration = self
            .iteration
            .checked_add(1)
            .ok_or(ClockError::IterationOverflow)?;
        Ok(self.iteration)
    }

    /// Return the current iteration.
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Return the creation instant.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record that `egg` first pipped at `now`.
    ///
    /// Returns `true` if this call stored the value, `false` if the egg
    /// already had a record (which is left untouched).
    pub fn record_first_pip(&mut self, egg: EggId, now: DateTime<Utc>) -> Result<bool, ClockError> {
        let egg_count = self.first_pips.len();
        let elapsed = now.signed_duration_since(self.started_at);
        let slot = self
            .first_pips
            .get_mut(egg.index())
            .ok_or(ClockError::UnknownEgg { egg, egg_count })?;
        if slot.is_some() {
            return Ok(false);
        }
        *slot = Some(elapsed);
        Ok(true)
    }

    /// Elapsed time to first pip for `egg`, if it has pipped.
    pub fn first_pip(&self, egg: EggId) -> Option<TimeDelta> {
        self.first_pips.get(egg.index()).copied().flatten()
    }

    /// All recorded first pips, in egg order.
    pub fn first_pip_records(&self) -> Vec<FirstPipRecord> {
        self.first_pips
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.map(|elapsed| FirstPipRecord {
                    egg: EggId::new(index),
                    elapsed_seconds: delta_seconds(elapsed),
                })
            })
            .collect()
    }
}

/// Convert a signed [`TimeDelta`] into fractional seconds.
pub fn delta_seconds(delta: TimeDelta) -> f64 {
    let magnitude = delta
        .abs()
        .to_std()
        .map_or(0.0, |duration| duration.as_secs_f64());
    if delta < TimeDelta::zero() {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn clock_starts_at_iteration_zero() {
        let clock = SimulationClock::new(3, start());
        assert_eq!(clock.iteration(), 0);
        assert_eq!(clock.started_at(), start());
        assert!(clock.first_pip_records().is_empty());
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimulationClock::new(3, start());
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.iteration(), 2);
    }

    #[test]
    fn first_pip_is_written_once() {
        let mut clock = SimulationClock::new(3, start());
        let egg = EggId::new(1);

        let first = start() + TimeDelta::milliseconds(2_500);
        assert!(clock.record_first_pip(egg, first).unwrap());
        assert_eq!(clock.first_pip(egg), Some(TimeDelta::milliseconds(2_500)));

        let later = start() + TimeDelta::seconds(60);
        assert!(!clock.record_first_pip(egg, later).unwrap());
        assert_eq!(clock.first_pip(egg), Some(TimeDelta::milliseconds(2_500)));

        assert_eq!(clock.first_pip(EggId::new(0)), None);
    }

    #[test]
    fn first_pip_records_report_seconds() {
        let mut clock = SimulationClock::new(3, start());
        clock
            .record_first_pip(EggId::new(2), start() + TimeDelta::milliseconds(1_250))
            .unwrap();
        let records = clock.first_pip_records();
        assert_eq!(records.len(), 1);
        let record = records.first().unwrap();
        assert_eq!(record.egg, EggId::new(2));
        assert!((record.elapsed_seconds - 1.25).abs() < 1e-9);
    }

    #[test]
    fn unknown_egg_rejected() {
        let mut clock = SimulationClock::new(2, start());
        let result = clock.record_first_pip(EggId::new(5), start());
        assert!(matches!(result, Err(ClockError::UnknownEgg { egg_count: 2, .. })));
    }

    #[test]
    fn delta_seconds_keeps_sign() {
        assert!((delta_seconds(TimeDelta::milliseconds(-500)) + 0.5).abs() < 1e-9);
        assert!((delta_seconds(TimeDelta::zero())).abs() < 1e-12);
    }
}
