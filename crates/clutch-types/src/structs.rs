//! Value objects produced by the simulation core for its observers.
//!
//! Snapshots and summaries are pure reads of simulation state. Renderers
//! react to them (resizing an egg marker, switching it to a hatchling
//! glyph, printing a report) but never feed anything back.

use serde::{Deserialize, Serialize, Serializer};

use crate::enums::DevelopmentPhase;
use crate::ids::EggId;

/// Multiplier converting mean cluster stage into an elapsed-weeks estimate.
pub const WEEKS_PER_STAGE: f64 = 0.4;

/// Serialize a float rounded to four decimal places, matching the
/// precision of the textual report.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn four_places<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10_000.0).round() / 10_000.0)
}

/// Observation of a single egg at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggSnapshot {
    /// Which egg this snapshot describes.
    pub id: EggId,
    /// Developmental progress.
    #[serde(serialize_with = "four_places")]
    pub stage: f64,
    /// Growth rate driving the next stage advance.
    #[serde(serialize_with = "four_places")]
    pub growth_rate: f64,
    /// Heart rate in beats per minute.
    #[serde(serialize_with = "four_places")]
    pub heart_rate: f64,
    /// Metabolic CO2 output proxy.
    #[serde(serialize_with = "four_places")]
    pub vco2: f64,
    /// Whether the egg pipped on its most recent check.
    pub is_pipping: bool,
    /// Whether the egg has hatched (sticky).
    pub is_hatched: bool,
    /// Visual size class for renderers (at least 1).
    pub size_class: u32,
    /// Derived developmental phase.
    pub phase: DevelopmentPhase,
}

impl core::fmt::Display for EggSnapshot {
    /// Render the five-line status block used by the console report.
    ///
    /// The last line reports pipping until the egg hatches, then reports
    /// the hatch instead.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tag = self.id.label();
        writeln!(f, "{tag} | Stage      :{:.4}", self.stage)?;
        writeln!(f, "{tag} | Growth Rate:{:.4}", self.growth_rate)?;
        writeln!(f, "{tag} | Heart Rate :{:.4}", self.heart_rate)?;
        writeln!(f, "{tag} | VCO2       :{:.4}", self.vco2)?;
        if self.is_hatched {
            writeln!(f, "{tag} | Is hatched?:{}", capitalised(self.is_hatched))
        } else {
            writeln!(f, "{tag} | Is pipping?:{}", capitalised(self.is_pipping))
        }
    }
}

/// Report flags print as `True` / `False`.
const fn capitalised(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

/// Cluster-level aggregate produced after each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Iteration number of the tick this summary describes.
    pub iteration: u64,
    /// Ambient temperature the cluster is incubated at.
    pub room_temperature: f64,
    /// Mean stage across all eggs.
    #[serde(serialize_with = "four_places")]
    pub mean_stage: f64,
    /// `mean_stage` converted to weeks via [`WEEKS_PER_STAGE`].
    #[serde(serialize_with = "four_places")]
    pub week_estimate: f64,
    /// Number of eggs in the cluster.
    pub egg_count: usize,
    /// Number of eggs that have hatched.
    pub hatched_count: usize,
}

impl ClusterSummary {
    /// Whether every egg in the cluster has hatched.
    pub const fn all_hatched(&self) -> bool {
        self.egg_count > 0 && self.hatched_count >= self.egg_count
    }
}

impl core::fmt::Display for ClusterSummary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Week {:.2} ( {} )", self.week_estimate, self.iteration)
    }
}

/// Wall-clock time from simulation start until an egg first pipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstPipRecord {
    /// The egg that pipped.
    pub egg: EggId,
    /// Real seconds elapsed between cluster creation and the first pip.
    pub elapsed_seconds: f64,
}
