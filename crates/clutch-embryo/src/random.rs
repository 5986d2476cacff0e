//! Randomness as an injected capability.
//!
//! Eggs never reach for a global generator. Every draw goes through a
//! [`RandomSource`] handed in by the caller, so the same code runs against
//! an OS-seeded generator in the engine, a seeded [`rand`] generator for
//! reproducible runs, and a [`ScriptedSource`] in tests.

use rand::Rng;

/// A supplier of uniform random draws.
pub trait RandomSource {
    /// Draw a value uniformly from `[low, high)`.
    ///
    /// Implementations return `low` when the range is empty.
    fn next_uniform(&mut self, low: f64, high: f64) -> f64;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).next_uniform(low, high)
    }
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    /// Wrap a generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.random_range(low..high)
        } else {
            low
        }
    }
}

/// Replays a fixed list of unit draws, cycling when exhausted.
///
/// Each stored value `u` (expected in `[0, 1)`) is mapped onto the
/// requested range as `low + u * (high - low)`. An empty script behaves as
/// if every draw were `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    position: usize,
    taken: usize,
}

impl ScriptedSource {
    /// Create a source that replays `draws` in order.
    pub const fn new(draws: Vec<f64>) -> Self {
        Self {
            draws,
            position: 0,
            taken: 0,
        }
    }

    /// Create a source that always yields the same unit draw.
    pub fn constant(unit: f64) -> Self {
        Self::new(vec![unit])
    }

    /// Number of draws consumed so far.
    pub const fn draws_taken(&self) -> usize {
        self.taken
    }

    fn next_unit(&mut self) -> f64 {
        let unit = self.draws.get(self.position).copied().unwrap_or(0.0);
        self.position = self.position.saturating_add(1);
        if self.position >= self.draws.len() {
            self.position = 0;
        }
        self.taken = self.taken.saturating_add(1);
        unit
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self, low: f64, high: f64) -> f64 {
        let unit = self.next_unit();
        (high - low).mul_add(unit, low)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn rng_source_stays_in_range() {
        let mut source = RngSource::new(SmallRng::seed_from_u64(42));
        for _ in 0..1000 {
            let draw = source.next_uniform(-19.0, 19.0);
            assert!((-19.0..19.0).contains(&draw));
        }
    }

    #[test]
    fn rng_source_empty_range_returns_low() {
        let mut source = RngSource::new(SmallRng::seed_from_u64(7));
        let draw = source.next_uniform(3.0, 3.0);
        assert!((draw - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = RngSource::new(SmallRng::seed_from_u64(99));
        let mut b = RngSource::new(SmallRng::seed_from_u64(99));
        for _ in 0..50 {
            let x = a.next_uniform(0.0, 1.0);
            let y = b.next_uniform(0.0, 1.0);
            assert!((x - y).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn scripted_source_scales_and_cycles() {
        let mut source = ScriptedSource::new(vec![0.0, 0.5]);
        assert!((source.next_uniform(0.0, 1.0) - 0.0).abs() < 1e-12);
        assert!((source.next_uniform(-19.0, 19.0) - 0.0).abs() < 1e-12);
        assert!((source.next_uniform(10.0, 20.0) - 10.0).abs() < 1e-12);
        assert_eq!(source.draws_taken(), 3);
    }

    #[test]
    fn empty_script_yields_low() {
        let mut source = ScriptedSource::default();
        assert!((source.next_uniform(2.0, 4.0) - 2.0).abs() < 1e-12);
    }
}
