// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bernoulli sampler deciding whether a sample-eligible record is kept.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Keeps each record with probability `rate`, independently per call.
pub struct Sampler {
    rate: f64,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Sampler seeded from OS entropy. `rate` is clamped to `0.0..=1.0`.
    pub fn new(rate: f64) -> Self {
        Self::with_rng(rate, StdRng::from_entropy())
    }

    /// Deterministic sampler for tests.
    pub fn seeded(rate: f64, seed: u64) -> Self {
        Self::with_rng(rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rate: f64, rng: StdRng) -> Self {
        let rate = if rate.is_nan() { 1.0 } else { rate.clamp(0.0, 1.0) };
        Self {
            rate,
            rng: Mutex::new(rng),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Draw once. `true` means persist.
    pub fn keep(&self) -> bool {
        if self.rate >= 1.0 {
            return true;
        }
        if self.rate <= 0.0 {
            return false;
        }
        // A poisoned lock only means another thread panicked mid-draw; the
        // generator state is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_bool(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_to_rate() {
        let sampler = Sampler::seeded(0.1, 42);
        let kept = (0..20_000).filter(|_| sampler.keep()).count();
        let ratio = kept as f64 / 20_000.0;
        assert!((ratio - 0.1).abs() < 0.01, "ratio was {ratio}");
    }

    #[test]
    fn extremes_are_deterministic() {
        let always = Sampler::new(1.0);
        let never = Sampler::new(0.0);
        assert!((0..100).all(|_| always.keep()));
        assert!((0..100).all(|_| !never.keep()));
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        assert_eq!(Sampler::new(7.0).rate(), 1.0);
        assert_eq!(Sampler::new(-1.0).rate(), 0.0);
    }
}
