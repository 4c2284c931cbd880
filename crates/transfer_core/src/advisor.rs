//! Direction suggestion seam. The bundled advisor is a coin flip.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng};
use shared::domain::{DestinationConfig, SourceConfig, TransferDirection};
use tracing::debug;

use crate::outcome::seeded_rng;

#[async_trait]
pub trait DirectionAdvisor: Send + Sync {
    async fn suggest(
        &self,
        source: &SourceConfig,
        destination: &DestinationConfig,
    ) -> Result<TransferDirection>;
}

pub struct RandomDirectionAdvisor {
    rng: Mutex<StdRng>,
}

impl RandomDirectionAdvisor {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Mutex::new(seeded_rng(seed)),
        }
    }
}

impl Default for RandomDirectionAdvisor {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl DirectionAdvisor for RandomDirectionAdvisor {
    async fn suggest(
        &self,
        _source: &SourceConfig,
        _destination: &DestinationConfig,
    ) -> Result<TransferDirection> {
        let pick_forward = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen_bool(0.5)
        };
        let direction = if pick_forward {
            TransferDirection::SourceToDestination
        } else {
            TransferDirection::DestinationToSource
        };
        debug!(%direction, "suggested transfer direction");
        Ok(direction)
    }
}
