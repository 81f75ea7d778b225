//! Injectable random source
//!
//! Every randomized duration, soil amount, weight and prescription in the
//! simulation is drawn through [`RandomSource`], so a test can pin the draws
//! while the server runs on a seeded or entropy-backed generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform draws
pub trait RandomSource: Send + Sync {
    /// Uniform draw from `0..upper`. Returns 0 when `upper` is 0.
    fn below(&self, upper: u64) -> u64;
}

/// `StdRng` behind a mutex
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Reproducible generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generator seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        // StdRng state stays valid across a poisoned lock.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(0..upper)
    }
}

/// Always yields the same draw, clamped into range
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub u64);

impl RandomSource for FixedRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            0
        } else {
            self.0.min(upper - 1)
        }
    }
}
