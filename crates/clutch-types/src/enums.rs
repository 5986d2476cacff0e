//! Enumeration types for the Clutch simulation.

use serde::{Deserialize, Serialize};

/// Where an egg sits in its developmental state machine.
///
/// `Developing -> PipEligible -> Pipping -> Hatched`. Pipping is
/// re-evaluated every tick and may flicker back to `PipEligible`; `Hatched`
/// is terminal because the hatch counter never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentPhase {
    /// Stage has not yet passed the pipping threshold.
    Developing,
    /// Stage is past the threshold but the egg is not pipping this tick.
    PipEligible,
    /// The egg pipped on its most recent check.
    Pipping,
    /// Cumulative pipping events exceeded the hatch threshold.
    Hatched,
}

impl DevelopmentPhase {
    /// Whether this phase is terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Hatched)
    }
}

impl core::fmt::Display for DevelopmentPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Developing => "developing",
            Self::PipEligible => "pip-eligible",
            Self::Pipping => "pipping",
            Self::Hatched => "hatched",
        };
        f.write_str(name)
    }
}
