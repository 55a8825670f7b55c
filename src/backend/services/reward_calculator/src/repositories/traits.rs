use async_trait::async_trait;
use anyhow::Result;
use tokio::sync::mpsc;

use crate::models::{
    chain::{ChainId, EraIndex},
    exposure::ValidatorExposure,
};

/// Chain storage change delivered by a subscription.
#[derive(Debug, Clone)]
pub enum ChainStateUpdate {
    /// Raw SCALE-encoded `TotalIssuance` storage value.
    TotalIssuance(Vec<u8>),
    /// Exposures of the validators elected for `era`.
    Validators {
        era: EraIndex,
        exposures: Vec<ValidatorExposure>,
    },
    /// The subscription failed to fetch or decode a value.
    Failed(String),
}

/// Source of chain state for a single chain.
///
/// The subscription ends when the returned receiver is dropped.
#[async_trait]
pub trait ChainStateSource: Send + Sync {
    async fn subscribe(&self, chain_id: ChainId) -> Result<mpsc::Receiver<ChainStateUpdate>>;
}
