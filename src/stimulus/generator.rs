use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct RateReading {
    pub timestamp: Instant,
    pub rate: f64,
    pub sequence_id: u64,
}

/// Uniform random firing rates in `[low, high)`, reproducible from a seed.
pub struct RateGenerator {
    rng: StdRng,
    sequence_counter: u64,
    low: f64,
    high: f64,
}

impl RateGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_range(seed, 0.0, 1.0)
    }

    /// An empty or inverted range degenerates to always returning `low`.
    pub fn with_range(seed: u64, low: f64, high: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sequence_counter: 0,
            low,
            high,
        }
    }

    pub fn generate(&mut self) -> RateReading {
        self.sequence_counter += 1;
        let rate = if self.low < self.high {
            self.rng.gen_range(self.low..self.high)
        } else {
            self.low
        };

        RateReading {
            timestamp: Instant::now(),
            rate,
            sequence_id: self.sequence_counter,
        }
    }

    pub fn get_sequence(&self) -> u64 {
        self.sequence_counter
    }
}
