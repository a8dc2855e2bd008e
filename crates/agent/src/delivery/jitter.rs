//! Randomized pre-delivery delay.
//!
//! Spreads submissions from many agents that saw the same block at the same
//! moment. Load shaping only; correctness never depends on it.

use std::time::Duration;

use rand::Rng;

/// Decides how long to wait before submitting a record.
pub trait DelayStrategy: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniform delay in `0..=max`, millisecond resolution.
pub fn jitter_delay<R: Rng + ?Sized>(max: Duration, rng: &mut R) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.random_range(0..=max_ms))
}

#[derive(Debug, Clone, Copy)]
pub struct RandomJitter {
    max: Duration,
}

impl RandomJitter {
    pub fn new(max: Duration) -> Self {
        Self { max }
    }
}

impl DelayStrategy for RandomJitter {
    fn next_delay(&self) -> Duration {
        jitter_delay(self.max, &mut rand::rng())
    }
}

/// Submit immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl DelayStrategy for NoJitter {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_jitter_stays_within_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let max = Duration::from_millis(6000);
        for _ in 0..1000 {
            assert!(jitter_delay(max, &mut rng) <= max);
        }
    }

    #[test]
    fn test_zero_bound_never_waits() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(jitter_delay(Duration::ZERO, &mut rng), Duration::ZERO);
        assert_eq!(jitter_delay(Duration::from_micros(900), &mut rng), Duration::ZERO);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let max = Duration::from_millis(6000);
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| jitter_delay(max, &mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| jitter_delay(max, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_strategies() {
        assert_eq!(NoJitter.next_delay(), Duration::ZERO);
        let jitter = RandomJitter::new(Duration::from_millis(10));
        assert!(jitter.next_delay() <= Duration::from_millis(10));
    }
}
