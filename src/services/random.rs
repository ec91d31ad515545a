use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Source of uniform draws in `[0, 1)` for simulated payment outcomes.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Reproducible draws, used when `simulation_seed` is configured.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.r#gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().r#gen::<f64>(),
        }
    }
}

/// Always returns the same draw.
#[cfg(test)]
pub struct FixedRandom(pub f64);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

/// Replays a fixed list of draws, then repeats the last one.
#[cfg(test)]
pub struct SequenceRandom {
    draws: Mutex<std::collections::VecDeque<f64>>,
    last: Mutex<f64>,
}

#[cfg(test)]
impl SequenceRandom {
    pub fn new(draws: &[f64]) -> Self {
        SequenceRandom {
            draws: Mutex::new(draws.iter().copied().collect()),
            last: Mutex::new(0.0),
        }
    }
}

#[cfg(test)]
impl RandomSource for SequenceRandom {
    fn next_unit(&self) -> f64 {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.draws.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}
