//! The egg cluster: ordered eggs, fixed neighbour coupling, and the
//! synchronised simulation step.
//!
//! Eggs sit in a `Vec` and refer to their neighbours by index. The wiring
//! (which captured `vco2` values feed each egg's metabolism) is computed
//! once at construction from a [`CouplingRule`] and never changes.
//!
//! # Step ordering
//!
//! 1. Capture every egg's `vco2` before anything is updated.
//! 2. Metabolise every egg against its coupling input taken from the
//!    captured values, so the result does not depend on egg order.
//! 3. Develop every egg.
//! 4. Once the iteration exceeds the warm-up count, let every egg try to
//!    pip.
//! 5. Advance the iteration.
//!
//! Updates are applied to a working copy of the eggs and committed only
//! once every egg has updated and the clock has advanced. A failed step
//! leaves the cluster exactly as it was.

use chrono::{DateTime, Utc};
use clutch_embryo::{Egg, EmbryoError, PhysiologyConfig, RandomSource};
use clutch_types::{ClusterSummary, EggId, EggSnapshot, WEEKS_PER_STAGE};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::clock::{ClockError, SimulationClock};

/// Fewest eggs a cluster can hold: every egg needs at least one neighbour.
pub const MIN_CLUSTER_SIZE: usize = 2;

/// Default number of ticks before pipping checks begin.
pub const DEFAULT_WARMUP_ITERATIONS: u64 = 5;

/// Errors that can occur while building or stepping a cluster.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Not enough seed stages to form a cluster.
    #[error("cluster needs at least {minimum} eggs, got {count}")]
    TooFewEggs {
        /// Number of seed stages supplied.
        count: usize,
        /// Minimum cluster size.
        minimum: usize,
    },

    /// The cluster configuration or neighbour wiring is unusable.
    #[error("invalid cluster configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// A cluster-level input was NaN or infinite.
    #[error("non-finite {quantity}: {value}")]
    NonFinite {
        /// Name of the offending input.
        quantity: &'static str,
        /// The offending value.
        value: f64,
    },

    /// An egg update failed.
    #[error("egg error: {source}")]
    Embryo {
        /// The underlying egg error.
        #[from]
        source: EmbryoError,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// How each egg picks the neighbour `vco2` that couples into its
/// metabolism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingRule {
    /// The first egg reads its next neighbour; every other egg reads its
    /// previous neighbour. For three eggs A, B, C: A and C read B, B reads A.
    #[default]
    Reference,

    /// Each egg reads the mean of its previous and next neighbours (only
    /// the one that exists, at either end).
    MeanOfNeighbours,
}

impl CouplingRule {
    /// Compute the source indices feeding each egg of a cluster of `size`.
    fn wire(self, size: usize) -> Vec<Vec<usize>> {
        (0..size)
            .map(|index| {
                let previous = index.checked_sub(1);
                let next = index.checked_add(1).filter(|&n| n < size);
                match self {
                    Self::Reference => previous.or(next).into_iter().collect(),
                    Self::MeanOfNeighbours => previous.into_iter().chain(next).collect(),
                }
            })
            .collect()
    }
}

/// Per-cluster tunables besides the seed stages and temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSettings {
    /// Pipping and hatching thresholds.
    pub physiology: PhysiologyConfig,
    /// Pipping is only attempted once the iteration exceeds this.
    pub warmup_iterations: u64,
    /// Neighbour coupling rule.
    pub coupling: CouplingRule,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            physiology: PhysiologyConfig::default(),
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            coupling: CouplingRule::default(),
        }
    }
}

/// What happened during one [`Cluster::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Iteration number the step ran at (before it was advanced).
    pub iteration: u64,
    /// Whether pipping checks ran this step.
    pub pip_checked: bool,
    /// Eggs that went from not pipping to pipping this step.
    pub pip_onsets: Vec<EggId>,
}

/// An ordered, fixed-size cluster of coupled eggs.
#[derive(Debug, Clone)]
pub struct Cluster {
    eggs: Vec<Egg>,
    /// Indices into `eggs` whose captured `vco2` feeds each egg.
    coupling: Vec<Vec<usize>>,
    room_temperature: f64,
    settings: ClusterSettings,
    clock: SimulationClock,
}

impl Cluster {
    /// Create a cluster with one egg per seed stage.
    ///
    /// Eggs draw their initial physiology from `rng` in seed order.
    pub fn new(
        seed_stages: &[f64],
        room_temperature: f64,
        settings: ClusterSettings,
        rng: &mut impl RandomSource,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ClusterError> {
        if seed_stages.len() < MIN_CLUSTER_SIZE {
            return Err(ClusterError::TooFewEggs {
                count: seed_stages.len(),
                minimum: MIN_CLUSTER_SIZE,
            });
        }
        ensure_finite("room_temperature", room_temperature)?;
        if let Some(&stage) = seed_stages.iter().find(|stage| !stage.is_finite()) {
            return Err(ClusterError::NonFinite {
                quantity: "seed_stage",
                value: stage,
            });
        }
        settings.physiology.validate()?;

        let eggs: Vec<Egg> = seed_stages
            .iter()
            .enumerate()
            .map(|(index, &stage)| Egg::new(EggId::new(index), stage, rng))
            .collect();
        Self::from_eggs(eggs, room_temperature, settings, started_at)
    }

    /// Assemble a cluster from already-built eggs.
    ///
    /// Egg ids must match their positions.
    pub fn from_eggs(
        eggs: Vec<Egg>,
        room_temperature: f64,
        settings: ClusterSettings,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ClusterError> {
        if eggs.len() < MIN_CLUSTER_SIZE {
            return Err(ClusterError::TooFewEggs {
                count: eggs.len(),
                minimum: MIN_CLUSTER_SIZE,
            });
        }
        ensure_finite("room_temperature", room_temperature)?;
        settings.physiology.validate()?;
        if let Some((index, egg)) = eggs
            .iter()
            .enumerate()
            .find(|(index, egg)| egg.id().index() != *index)
        {
            return Err(ClusterError::InvalidConfig {
                reason: format!("egg {} sits at position {index}", egg.id()),
            });
        }

        let coupling = settings.coupling.wire(eggs.len());
        if let Some(index) = coupling.iter().position(Vec::is_empty) {
            return Err(ClusterError::InvalidConfig {
                reason: format!("egg {} has no coupling neighbour", EggId::new(index)),
            });
        }

        info!(
            egg_count = eggs.len(),
            room_temperature,
            coupling = ?settings.coupling,
            warmup_iterations = settings.warmup_iterations,
            "Cluster created"
        );

        let clock = SimulationClock::new(eggs.len(), started_at);
        Ok(Self {
            eggs,
            coupling,
            room_temperature,
            settings,
            clock,
        })
    }

    /// Run one synchronised tick at `temperature`.
    pub fn step(
        &mut self,
        temperature: f64,
        rng: &mut impl RandomSource,
    ) -> Result<StepOutcome, ClusterError> {
        ensure_finite("temperature", temperature)?;
        let iteration = self.clock.iteration();

        // 1. Capture pre-tick vco2 for every egg.
        let captured: Vec<f64> = self.eggs.iter().map(Egg::vco2).collect();
        let mut next = self.eggs.clone();

        // 2. Metabolise against captured neighbour values.
        for (index, egg) in next.iter_mut().enumerate() {
            let input = coupling_input(&self.coupling, index, &captured)?;
            egg.metabolise(temperature, input)?;
        }

        // 3. Develop.
        for egg in &mut next {
            egg.develop(temperature)?;
        }

        // 4. Pipping checks after warm-up.
        let pip_checked = iteration > self.settings.warmup_iterations;
        let mut pip_onsets = Vec::new();
        if pip_checked {
            let physiology = self.settings.physiology;
            for egg in &mut next {
                if egg.try_pip(&physiology, rng) {
                    pip_onsets.push(egg.id());
                }
            }
        }

        // 5. Advance, then commit.
        self.clock.advance()?;
        self.eggs = next;

        debug!(
            iteration,
            temperature,
            pip_checked,
            onsets = pip_onsets.len(),
            "Cluster stepped"
        );

        Ok(StepOutcome {
            iteration,
            pip_checked,
            pip_onsets,
        })
    }

    /// Mean stage and its week estimate, plus hatch progress.
    ///
    /// `iteration` is the most recently executed tick (0 before the first
    /// step), matching [`StepOutcome::iteration`].
    pub fn summary(&self) -> ClusterSummary {
        let total: f64 = self.eggs.iter().map(Egg::stage).sum();
        let count = u32::try_from(self.eggs.len()).map_or(f64::from(u32::MAX), f64::from);
        let mean_stage = total / count;
        ClusterSummary {
            iteration: self.clock.iteration().saturating_sub(1),
            room_temperature: self.room_temperature,
            mean_stage,
            week_estimate: mean_stage * WEEKS_PER_STAGE,
            egg_count: self.eggs.len(),
            hatched_count: self.hatched_count(),
        }
    }

    /// Snapshot every egg, in order.
    pub fn snapshots(&self) -> Vec<EggSnapshot> {
        self.eggs
            .iter()
            .map(|egg| egg.observe(&self.settings.physiology))
            .collect()
    }

    /// Number of hatched eggs.
    pub fn hatched_count(&self) -> usize {
        self.eggs
            .iter()
            .filter(|egg| egg.is_hatched(&self.settings.physiology))
            .count()
    }

    /// Whether every egg has hatched.
    pub fn all_hatched(&self) -> bool {
        self.hatched_count() == self.eggs.len()
    }

    /// The eggs, in cluster order.
    pub fn eggs(&self) -> &[Egg] {
        &self.eggs
    }

    /// Look up one egg.
    pub fn egg(&self, id: EggId) -> Option<&Egg> {
        self.eggs.get(id.index())
    }

    /// Indices of the eggs whose `vco2` couples into `id`.
    pub fn coupling_sources(&self, id: EggId) -> Option<&[usize]> {
        self.coupling.get(id.index()).map(Vec::as_slice)
    }

    /// The coupling rule the wiring was built from.
    pub const fn coupling_rule(&self) -> CouplingRule {
        self.settings.coupling
    }

    /// Ambient temperature the cluster was created for.
    pub const fn room_temperature(&self) -> f64 {
        self.room_temperature
    }

    /// Cluster tunables.
    pub const fn settings(&self) -> &ClusterSettings {
        &self.settings
    }

    /// Current iteration.
    pub const fn iteration(&self) -> u64 {
        self.clock.iteration()
    }

    /// The simulation clock.
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Mutable access to the clock, for recording first pips.
    pub const fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }
}

/// Mean of the captured `vco2` values wired into egg `index`.
fn coupling_input(
    coupling: &[Vec<usize>],
    index: usize,
    captured: &[f64],
) -> Result<f64, ClusterError> {
    let sources = coupling
        .get(index)
        .filter(|sources| !sources.is_empty())
        .ok_or_else(|| ClusterError::InvalidConfig {
            reason: format!("egg {} has no coupling neighbour", EggId::new(index)),
        })?;

    let mut total = 0.0;
    let mut count = 0.0;
    for &source in sources {
        let value = captured
            .get(source)
            .ok_or_else(|| ClusterError::InvalidConfig {
                reason: format!(
                    "egg {} is wired to missing neighbour {source}",
                    EggId::new(index)
                ),
            })?;
        total += value;
        count += 1.0;
    }
    Ok(total / count)
}

fn ensure_finite(quantity: &'static str, value: f64) -> Result<(), ClusterError> {
    if value.is_finite() {
        Ok(())
    } else {
        error!(quantity, value, "Non-finite cluster input");
        Err(ClusterError::NonFinite { quantity, value })
    }
}
