use crate::models::chain::{Balance, ChainId, EraIndex};
use crate::models::exposure::ValidatorExposure;

/// Immutable view of the chain state the calculator works on.
///
/// A snapshot is never modified after construction. New chain data produces
/// a new snapshot with a higher `generation`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStateSnapshot {
    chain_id: ChainId,
    era: EraIndex,
    generation: u64,
    total_issuance: Balance,
    validators: Vec<ValidatorExposure>,
}

impl ChainStateSnapshot {
    pub fn new(
        chain_id: ChainId,
        era: EraIndex,
        generation: u64,
        total_issuance: Balance,
        validators: Vec<ValidatorExposure>,
    ) -> Self {
        Self {
            chain_id,
            era,
            generation,
            total_issuance,
            validators,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn era(&self) -> EraIndex {
        self.era
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_issuance(&self) -> Balance {
        self.total_issuance
    }

    pub fn validators(&self) -> &[ValidatorExposure] {
        &self.validators
    }
}
