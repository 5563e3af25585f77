//! Randomized pauses between worker iterations.

use core::time::Duration;

use foundation_sync::{ConfigurationError, ConfigurationResult};
use serde::Deserialize;

/// Inclusive millisecond range a worker sleeps within between operations.
///
/// Jitter only spreads operations out in time; no correctness property
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Jitter {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Jitter {
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No pause at all.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidJitter`] when `min_ms > max_ms`.
    pub const fn validate(&self) -> ConfigurationResult<()> {
        if self.min_ms > self.max_ms {
            return Err(ConfigurationError::InvalidJitter {
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.u64(self.min_ms..=self.max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_within_bounds() {
        let jitter = Jitter::new(100, 500);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..1000 {
            let pause = jitter.sample(&mut rng);
            assert!(pause >= Duration::from_millis(100));
            assert!(pause <= Duration::from_millis(500));
        }
    }

    #[test]
    fn degenerate_ranges_are_fixed() {
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(Jitter::none().sample(&mut rng), Duration::ZERO);
        assert_eq!(Jitter::fixed(15).sample(&mut rng), Duration::from_millis(15));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            Jitter::new(10, 5).validate(),
            Err(ConfigurationError::InvalidJitter {
                min_ms: 10,
                max_ms: 5
            })
        );
        assert!(Jitter::new(5, 10).validate().is_ok());
    }

    #[test]
    fn same_seed_same_sequence() {
        let jitter = Jitter::new(0, 1000);
        let mut left = fastrand::Rng::with_seed(42);
        let mut right = fastrand::Rng::with_seed(42);
        for _ in 0..16 {
            assert_eq!(jitter.sample(&mut left), jitter.sample(&mut right));
        }
    }
}
