use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};
use shared::domain::TransferOutcome;

/// Decides how a finished run resolves.
pub trait OutcomeSource: Send + Sync {
    fn draw(&self) -> TransferOutcome;
}

/// Weighted coin: `success_probability` of success, failure otherwise.
pub struct WeightedOutcomeSource {
    success_probability: f64,
    rng: Mutex<StdRng>,
}

impl WeightedOutcomeSource {
    pub fn new(success_probability: f64, seed: Option<u64>) -> Self {
        let success_probability = if success_probability.is_nan() {
            0.0
        } else {
            success_probability.clamp(0.0, 1.0)
        };
        Self {
            success_probability,
            rng: Mutex::new(seeded_rng(seed)),
        }
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }
}

impl OutcomeSource for WeightedOutcomeSource {
    fn draw(&self) -> TransferOutcome {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if rng.gen_bool(self.success_probability) {
            TransferOutcome::Success
        } else {
            TransferOutcome::Failure
        }
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
