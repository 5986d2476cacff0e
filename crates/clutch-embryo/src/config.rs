//! Thresholds governing pipping and hatching.
//!
//! The [`PhysiologyConfig`] struct bundles every tunable consulted by
//! [`Egg::try_pip`](crate::Egg::try_pip) and
//! [`Egg::observe`](crate::Egg::observe) so callers (cluster, tests) can
//! override the defaults.

use serde::Deserialize;

use crate::error::EmbryoError;

/// Configuration for the pipping and hatching decisions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PhysiologyConfig {
    /// Stage an egg must exceed before pipping is attempted (default: 14).
    ///
    /// Also normalises the stage in the pipping success factor.
    #[serde(default = "default_stage_threshold")]
    pub stage_threshold: u32,

    /// Success factor an attempt must exceed to pip (default: 1.9).
    #[serde(default = "default_pip_success_threshold")]
    pub pip_success_threshold: f64,

    /// Pipping events an egg must exceed to count as hatched (default: 2).
    #[serde(default = "default_hatch_threshold")]
    pub hatch_threshold: u32,
}

impl Default for PhysiologyConfig {
    fn default() -> Self {
        Self {
            stage_threshold: default_stage_threshold(),
            pip_success_threshold: default_pip_success_threshold(),
            hatch_threshold: default_hatch_threshold(),
        }
    }
}

impl PhysiologyConfig {
    /// Check that the thresholds can drive the pipping formula.
    pub fn validate(&self) -> Result<(), EmbryoError> {
        if self.stage_threshold == 0 {
            return Err(EmbryoError::InvalidConfig {
                reason: "stage_threshold must be at least 1".to_owned(),
            });
        }
        if !self.pip_success_threshold.is_finite() || self.pip_success_threshold <= 0.0 {
            return Err(EmbryoError::InvalidConfig {
                reason: format!(
                    "pip_success_threshold must be a positive finite number, got {}",
                    self.pip_success_threshold
                ),
            });
        }
        Ok(())
    }

    /// The stage threshold as a float, for use in the formulas.
    pub fn stage_threshold_f64(&self) -> f64 {
        f64::from(self.stage_threshold)
    }
}

const fn default_stage_threshold() -> u32 {
    14
}

const fn default_pip_success_threshold() -> f64 {
    1.9
}

const fn default_hatch_threshold() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PhysiologyConfig::default();
        assert_eq!(config.stage_threshold, 14);
        assert_eq!(config.hatch_threshold, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_stage_threshold_rejected() {
        let config = PhysiologyConfig {
            stage_threshold: 0,
            ..PhysiologyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_success_threshold_rejected() {
        let config = PhysiologyConfig {
            pip_success_threshold: f64::NAN,
            ..PhysiologyConfig::default()
        };
        assert!(config.validate().is_err());

        let negative = PhysiologyConfig {
            pip_success_threshold: -1.0,
            ..PhysiologyConfig::default()
        };
        assert!(negative.validate().is_err());
    }
}
