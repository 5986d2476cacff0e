//! The egg agent and its per-tick physiology.
//!
//! Each tick the cluster drives an egg through, in order:
//!
//! 1. [`Egg::metabolise`] -- recompute `vco2`, heart rate, and growth rate,
//!    nudged by a neighbour's pre-tick `vco2`
//! 2. [`Egg::develop`] -- advance the stage by the growth rate
//! 3. [`Egg::try_pip`] -- once warmed up, roll for pipping and count
//!    towards hatching
//!
//! [`Egg::observe`] is a pure read returning an [`EggSnapshot`].
//!
//! The formulas are heuristics and are reproduced exactly; in particular
//! the growth rate mixes the freshly computed heart rate with the
//! un-blended `vco2`, and the neighbour blend only feeds the accelerator.
//!
//! Every update computes its new values first and checks them for
//! finiteness before committing, so a failed update leaves the egg as it
//! was.

use clutch_types::{DevelopmentPhase, EggId, EggSnapshot};
use tracing::{debug, error, info};

use crate::config::PhysiologyConfig;
use crate::error::EmbryoError;
use crate::random::RandomSource;

/// Reference incubation temperature the formulas are normalised against.
const REFERENCE_TEMPERATURE: f64 = 26.0;

/// Stage divisor in the `vco2` formula.
const VCO2_STAGE_SCALE: f64 = 14.0;

/// Stage divisor in the heart-rate formula.
const HEART_STAGE_SCALE: f64 = 17.0;

/// Stage span covered by one visual size class.
const SIZE_CLASS_SPAN: f64 = 5.0;

/// A single incubating egg.
///
/// `meta_rate` is fixed at creation. `hatch_count` only ever grows, so
/// hatching is sticky. Whether the egg has hatched is derived from
/// `hatch_count`, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Egg {
    id: EggId,
    stage: f64,
    vco2: f64,
    meta_rate: f64,
    heart_rate: f64,
    growth_rate: f64,
    is_pipping: bool,
    hatch_count: u32,
}

impl Egg {
    /// Create an egg at `seed_stage` with randomised physiology.
    ///
    /// Draws, in order: `vco2` from U(0,1), `meta_rate` from U(0,1), heart
    /// rate as 50 + U(-19,19), growth rate as 1 + U(0,1).
    pub fn new(id: EggId, seed_stage: f64, rng: &mut impl RandomSource) -> Self {
        let vco2 = rng.next_uniform(0.0, 1.0);
        let meta_rate = rng.next_uniform(0.0, 1.0);
        let heart_rate = 50.0 + rng.next_uniform(-19.0, 19.0);
        let growth_rate = 1.0 + rng.next_uniform(0.0, 1.0);
        Self::from_parts(id, seed_stage, vco2, meta_rate, heart_rate, growth_rate)
    }

    /// Create an egg from explicit physiology (deterministic setups and
    /// state restoration).
    pub const fn from_parts(
        id: EggId,
        stage: f64,
        vco2: f64,
        meta_rate: f64,
        heart_rate: f64,
        growth_rate: f64,
    ) -> Self {
        Self {
            id,
            stage,
            vco2,
            meta_rate,
            heart_rate,
            growth_rate,
            is_pipping: false,
            hatch_count: 0,
        }
    }

    /// Identifier of this egg within its cluster.
    pub const fn id(&self) -> EggId {
        self.id
    }

    /// Current developmental stage.
    pub const fn stage(&self) -> f64 {
        self.stage
    }

    /// Current metabolic CO2 output proxy.
    pub const fn vco2(&self) -> f64 {
        self.vco2
    }

    /// Metabolic rate fixed at creation.
    pub const fn meta_rate(&self) -> f64 {
        self.meta_rate
    }

    /// Current heart rate.
    pub const fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    /// Current growth rate.
    pub const fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Whether the egg pipped on its most recent check.
    pub const fn is_pipping(&self) -> bool {
        self.is_pipping
    }

    /// Number of checks on which the egg was pipping.
    pub const fn hatch_count(&self) -> u32 {
        self.hatch_count
    }

    /// Whether the egg has hatched under `config`.
    pub const fn is_hatched(&self, config: &PhysiologyConfig) -> bool {
        self.hatch_count > config.hatch_threshold
    }

    /// Advance the stage at `temperature`.
    ///
    /// `stage += (growth_rate * temperature / 26) / sqrt(2)`. No bounds.
    pub fn develop(&mut self, temperature: f64) -> Result<(), EmbryoError> {
        let advance =
            (self.growth_rate * temperature / REFERENCE_TEMPERATURE) / core::f64::consts::SQRT_2;
        let stage = self.checked("stage", self.stage + advance)?;
        self.stage = stage;
        Ok(())
    }

    /// Recompute metabolism at `temperature`, coupled to `neighbour_vco2`.
    ///
    /// `neighbour_vco2` must be the neighbour's value from before the
    /// current tick began, not one already updated this tick.
    pub fn metabolise(&mut self, temperature: f64, neighbour_vco2: f64) -> Result<(), EmbryoError> {
        let vco2 = 0.5
            + 1.1 * (self.stage / VCO2_STAGE_SCALE)
            + ((1.0 + self.meta_rate) + (self.heart_rate / 80.0)) / 2.0;

        let neo_vco2 = (vco2 + neighbour_vco2) / 2.0;
        let accelerator = (neo_vco2 - vco2) * 1.5;

        let heart_rate = 80.0
            + 15.0 * (self.stage / HEART_STAGE_SCALE)
            + (temperature / REFERENCE_TEMPERATURE) / 30.0;

        let growth_rate = 1.0 + (accelerator + (heart_rate / 90.0 + vco2) / 2.0);

        let vco2 = self.checked("vco2", vco2)?;
        let heart_rate = self.checked("heart_rate", heart_rate)?;
        let growth_rate = self.checked("growth_rate", growth_rate)?;

        self.vco2 = vco2;
        self.heart_rate = heart_rate;
        self.growth_rate = growth_rate;

        debug!(
            egg = %self.id,
            stage = self.stage,
            vco2,
            heart_rate,
            growth_rate,
            accelerator,
            "Egg metabolised"
        );
        Ok(())
    }

    /// Roll for pipping and count towards hatching.
    ///
    /// At or below the stage threshold the egg stops pipping and no draw is
    /// consumed. Above it, one U(0,1) draw gives the success factor
    /// `(stage / stage_threshold) * (1 + draw)`, and the egg pips when that
    /// exceeds `pip_success_threshold`. Every call that leaves the egg
    /// pipping increments `hatch_count`.
    ///
    /// Returns `true` when the egg went from not pipping to pipping.
    pub fn try_pip(&mut self, config: &PhysiologyConfig, rng: &mut impl RandomSource) -> bool {
        let was_pipping = self.is_pipping;
        let threshold = config.stage_threshold_f64();

        self.is_pipping = if self.stage > threshold {
            let success_factor = (self.stage / threshold) * (1.0 + rng.next_uniform(0.0, 1.0));
            success_factor > config.pip_success_threshold
        } else {
            false
        };

        if self.is_pipping {
            let was_hatched = self.is_hatched(config);
            self.hatch_count = self.hatch_count.saturating_add(1);
            if !was_hatched && self.is_hatched(config) {
                info!(egg = %self.id, stage = self.stage, "Egg hatched");
            }
        }

        let onset = self.is_pipping && !was_pipping;
        if onset {
            info!(
                egg = %self.id,
                stage = self.stage,
                hatch_count = self.hatch_count,
                "Egg started pipping"
            );
        }
        onset
    }

    /// Derive the developmental phase under `config`.
    pub fn phase(&self, config: &PhysiologyConfig) -> DevelopmentPhase {
        if self.is_hatched(config) {
            DevelopmentPhase::Hatched
        } else if self.is_pipping {
            DevelopmentPhase::Pipping
        } else if self.stage > config.stage_threshold_f64() {
            DevelopmentPhase::PipEligible
        } else {
            DevelopmentPhase::Developing
        }
    }

    /// Visual size class: `floor(1 + stage / 5)` for positive stages,
    /// otherwise 1. Never below 1.
    pub fn size_class(&self) -> u32 {
        if self.stage > 0.0 {
            let raw = (1.0 + self.stage / SIZE_CLASS_SPAN)
                .floor()
                .min(f64::from(u32::MAX));
            // Non-negative and clamped to the u32 range above.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let class = raw as u32;
            class.max(1)
        } else {
            1
        }
    }

    /// Take a snapshot of this egg. Pure read.
    pub fn observe(&self, config: &PhysiologyConfig) -> EggSnapshot {
        EggSnapshot {
            id: self.id,
            stage: self.stage,
            growth_rate: self.growth_rate,
            heart_rate: self.heart_rate,
            vco2: self.vco2,
            is_pipping: self.is_pipping,
            is_hatched: self.is_hatched(config),
            size_class: self.size_class(),
            phase: self.phase(config),
        }
    }

    fn checked(&self, quantity: &'static str, value: f64) -> Result<f64, EmbryoError> {
        if value.is_finite() {
            Ok(value)
        } else {
            error!(egg = %self.id, quantity, value, "Non-finite egg state");
            Err(EmbryoError::NonFinite {
                egg: self.id,
                quantity,
                value,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;

    const TOLERANCE: f64 = 1e-3;

    fn egg_at(stage: f64) -> Egg {
        Egg::from_parts(EggId::new(0), stage, 0.5, 0.5, 50.0, 1.5)
    }

    #[test]
    fn new_draws_physiology_in_order() {
        // vco2, meta_rate, heart offset, growth offset
        let mut rng = ScriptedSource::new(vec![0.25, 0.75, 0.5, 0.1]);
        let egg = Egg::new(EggId::new(1), -10.1, &mut rng);
        assert!((egg.vco2() - 0.25).abs() < 1e-12);
        assert!((egg.meta_rate() - 0.75).abs() < 1e-12);
        assert!((egg.heart_rate() - 50.0).abs() < 1e-12);
        assert!((egg.growth_rate() - 1.1).abs() < 1e-12);
        assert!((egg.stage() + 10.1).abs() < 1e-12);
        assert!(!egg.is_pipping());
        assert_eq!(egg.hatch_count(), 0);
        assert_eq!(rng.draws_taken(), 4);
    }

    #[test]
    fn develop_matches_reference_scenario() {
        let mut egg = Egg::from_parts(EggId::new(0), -10.1, 0.5, 0.5, 50.0, 2.0);
        egg.develop(30.0).unwrap();
        assert!((egg.stage() - (-8.469)).abs() < TOLERANCE);
    }

    #[test]
    fn develop_is_monotonic_for_positive_inputs() {
        let mut egg = egg_at(3.0);
        let mut previous = egg.stage();
        for temperature in [0.5, 12.0, 26.0, 30.0, 41.0] {
            egg.develop(temperature).unwrap();
            assert!(egg.stage() >= previous);
            previous = egg.stage();
        }
    }

    #[test]
    fn metabolise_vco2_matches_reference_scenario() {
        let mut egg = Egg::from_parts(EggId::new(0), 20.0, 0.0, 0.5, 90.0, 1.0);
        egg.metabolise(30.0, 3.384).unwrap();
        assert!((egg.vco2() - 3.384).abs() < TOLERANCE);
    }

    #[test]
    fn metabolise_uses_new_heart_rate_and_unblended_vco2() {
        let stage = 20.0;
        let temperature = 30.0;
        let neighbour = 1.0;
        let mut egg = Egg::from_parts(EggId::new(0), stage, 0.0, 0.5, 90.0, 1.0);
        egg.metabolise(temperature, neighbour).unwrap();

        let vco2 = 0.5 + 1.1 * (stage / 14.0) + ((1.0 + 0.5) + 90.0 / 80.0) / 2.0;
        let accelerator = ((vco2 + neighbour) / 2.0 - vco2) * 1.5;
        let heart = 80.0 + 15.0 * (stage / 17.0) + (temperature / 26.0) / 30.0;
        let growth = 1.0 + (accelerator + (heart / 90.0 + vco2) / 2.0);

        assert!((egg.vco2() - vco2).abs() < 1e-12);
        assert!((egg.heart_rate() - heart).abs() < 1e-12);
        assert!((egg.growth_rate() - growth).abs() < 1e-12);
        // meta rate never changes
        assert!((egg.meta_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn metabolise_is_deterministic() {
        let mut a = egg_at(7.5);
        let mut b = egg_at(7.5);
        a.metabolise(29.0, 2.2).unwrap();
        b.metabolise(29.0, 2.2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_finite_update_is_rejected_and_state_kept() {
        let mut egg = egg_at(5.0);
        let before = egg.clone();
        let result = egg.metabolise(f64::NAN, 1.0);
        assert!(matches!(
            result,
            Err(EmbryoError::NonFinite {
                quantity: "heart_rate",
                ..
            })
        ));
        assert_eq!(egg, before);

        let result = egg.develop(f64::INFINITY);
        assert!(result.is_err());
        assert_eq!(egg, before);
    }

    #[test]
    fn no_pipping_at_or_below_threshold_and_no_draw() {
        let config = PhysiologyConfig::default();
        let mut rng = ScriptedSource::constant(0.99);
        for stage in [-4.0, 0.0, 13.9, 14.0] {
            let mut egg = egg_at(stage);
            let onset = egg.try_pip(&config, &mut rng);
            assert!(!onset);
            assert!(!egg.is_pipping());
            assert_eq!(egg.hatch_count(), 0);
        }
        assert_eq!(rng.draws_taken(), 0);
    }

    #[test]
    fn pipping_follows_success_factor() {
        let config = PhysiologyConfig::default();

        // 21/14 * (1 + 0.2) = 1.8 -> no pip
        let mut egg = egg_at(21.0);
        assert!(!egg.try_pip(&config, &mut ScriptedSource::constant(0.2)));
        assert!(!egg.is_pipping());

        // 21/14 * (1 + 0.5) = 2.25 -> pip
        assert!(egg.try_pip(&config, &mut ScriptedSource::constant(0.5)));
        assert!(egg.is_pipping());
        assert_eq!(egg.hatch_count(), 1);

        // still pipping: not an onset, but counts
        assert!(!egg.try_pip(&config, &mut ScriptedSource::constant(0.5)));
        assert_eq!(egg.hatch_count(), 2);
    }

    #[test]
    fn hatching_is_sticky_through_flicker() {
        let config = PhysiologyConfig::default();
        let mut egg = egg_at(21.0);
        let mut rng = ScriptedSource::new(vec![0.9, 0.9, 0.9, 0.0, 0.0]);
        let mut last_count = 0;
        let mut hatched_seen = false;
        for _ in 0..10 {
            egg.try_pip(&config, &mut rng);
            assert!(egg.hatch_count() >= last_count);
            last_count = egg.hatch_count();
            if hatched_seen {
                assert!(egg.is_hatched(&config));
            }
            hatched_seen |= egg.is_hatched(&config);
        }
        assert!(hatched_seen);
        assert_eq!(egg.phase(&config), DevelopmentPhase::Hatched);
    }

    #[test]
    fn hatch_needs_more_than_threshold_pips() {
        let config = PhysiologyConfig::default();
        let mut egg = egg_at(28.0);
        let mut rng = ScriptedSource::constant(0.5);
        egg.try_pip(&config, &mut rng);
        egg.try_pip(&config, &mut rng);
        assert!(!egg.is_hatched(&config));
        egg.try_pip(&config, &mut rng);
        assert!(egg.is_hatched(&config));
    }

    #[test]
    fn raised_hatch_threshold_needs_five_pips() {
        let config = PhysiologyConfig {
            hatch_threshold: 4,
            ..PhysiologyConfig::default()
        };
        let mut egg = egg_at(28.0);
        let mut rng = ScriptedSource::constant(0.5);
        for pips in 1..=4 {
            egg.try_pip(&config, &mut rng);
            assert_eq!(egg.hatch_count(), pips);
            assert!(!egg.is_hatched(&config));
        }
        egg.try_pip(&config, &mut rng);
        assert_eq!(egg.hatch_count(), 5);
        assert!(egg.is_hatched(&config));
        assert_eq!(egg.phase(&config), DevelopmentPhase::Hatched);
    }

    #[test]
    fn lowered_stage_threshold_moves_gate_and_normalisation() {
        let config = PhysiologyConfig {
            stage_threshold: 10,
            ..PhysiologyConfig::default()
        };
        let mut rng = ScriptedSource::new(vec![0.5, 0.6]);

        // At the threshold: gated, no draw.
        let mut at_gate = egg_at(10.0);
        assert!(!at_gate.try_pip(&config, &mut rng));
        assert_eq!(rng.draws_taken(), 0);

        // Gated under the default threshold, eligible under 10.
        let mut egg = egg_at(12.0);
        assert_eq!(egg.phase(&PhysiologyConfig::default()), DevelopmentPhase::Developing);
        assert_eq!(egg.phase(&config), DevelopmentPhase::PipEligible);

        // 12/10 * (1 + 0.5) = 1.8 -> no pip
        assert!(!egg.try_pip(&config, &mut rng));
        assert_eq!(rng.draws_taken(), 1);

        // 12/10 * (1 + 0.6) = 1.92 -> pip
        assert!(egg.try_pip(&config, &mut rng));
        assert_eq!(egg.hatch_count(), 1);
    }

    #[test]
    fn size_class_boundaries() {
        assert_eq!(egg_at(-10.1).size_class(), 1);
        assert_eq!(egg_at(0.0).size_class(), 1);
        assert_eq!(egg_at(0.01).size_class(), 1);
        assert_eq!(egg_at(4.99).size_class(), 1);
        assert_eq!(egg_at(5.0).size_class(), 2);
        assert_eq!(egg_at(17.3).size_class(), 4);
        assert_eq!(egg_at(f64::NAN).size_class(), 1);
    }

    #[test]
    fn phases_follow_state_machine() {
        let config = PhysiologyConfig::default();
        assert_eq!(egg_at(3.0).phase(&config), DevelopmentPhase::Developing);
        assert_eq!(egg_at(14.5).phase(&config), DevelopmentPhase::PipEligible);

        let mut egg = egg_at(28.0);
        egg.try_pip(&config, &mut ScriptedSource::constant(0.5));
        assert_eq!(egg.phase(&config), DevelopmentPhase::Pipping);
    }

    #[test]
    fn observe_is_pure() {
        let config = PhysiologyConfig::default();
        let mut egg = egg_at(16.0);
        egg.try_pip(&config, &mut ScriptedSource::constant(0.9));
        let before = egg.clone();
        let first = egg.observe(&config);
        let second = egg.observe(&config);
        assert_eq!(first, second);
        assert_eq!(egg, before);
        assert!(first.is_pipping);
        assert!(!first.is_hatched);
        assert_eq!(first.size_class, 4);
    }
}
