//! Wall-clock and randomness ports, swapped for fixed values in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// Real-world time source for cooldown expiry.
pub trait WallClock {
    fn now_millis(&self) -> i64;
}

/// Uniform draws in `[0, 1)` for rule chance gates.
pub trait RandomSource {
    fn next_unit(&self) -> f64;
}

/// System clock - uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Thread-local randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible draws from a seed, for replays.
#[derive(Debug)]
pub struct SeededRandom {
    rng: RefCell<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        self.rng.borrow_mut().gen::<f64>()
    }
}

/// Manually advanced clock for testing.
#[cfg(test)]
pub struct FixedWallClock(pub std::cell::Cell<i64>);

#[cfg(test)]
impl FixedWallClock {
    pub fn at(millis: i64) -> Self {
        Self(std::cell::Cell::new(millis))
    }

    pub fn advance(&self, millis: i64) {
        self.0.set(self.0.get() + millis);
    }
}

#[cfg(test)]
impl WallClock for FixedWallClock {
    fn now_millis(&self) -> i64 {
        self.0.get()
    }
}

/// Fixed draw for testing.
#[cfg(test)]
pub struct FixedRandom(pub std::cell::Cell<f64>);

#[cfg(test)]
impl FixedRandom {
    pub fn always(value: f64) -> Self {
        Self(std::cell::Cell::new(value))
    }
}

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        for _ in 0..20 {
            let draw = a.next_unit();
            assert!((0.0..1.0).contains(&draw));
            assert_eq!(draw, b.next_unit());
        }
    }

    #[test]
    fn test_thread_random_in_unit_range() {
        for _ in 0..100 {
            assert!((0.0..1.0).contains(&ThreadRandom.next_unit()));
        }
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedWallClock::at(1_000);
        clock.advance(500);
        assert_eq!(clock.now_millis(), 1_500);
    }
}
