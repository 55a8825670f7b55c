use serde::{Deserialize, Serialize};
use sp_core::H256;
use std::fmt;

use crate::utils::errors::{CalculatorError, Result};

pub use sp_core::crypto::AccountId32 as AccountId;
pub use sp_runtime::Permill;

pub type Balance = u128;
pub type EraIndex = u32;

/// Identifies a chain by its genesis hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(pub H256);

impl ChainId {
    pub fn from_genesis(genesis_hash: [u8; 32]) -> Self {
        Self(H256::from(genesis_hash))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ChainId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let digits = value.strip_prefix("0x").unwrap_or(&value);
        let bytes = hex::decode(digits).map_err(|e| format!("invalid chain id {value}: {e}"))?;

        if bytes.len() != 32 {
            return Err(format!("chain id must be 32 bytes, got {}", bytes.len()));
        }

        Ok(Self(H256::from_slice(&bytes)))
    }
}

/// Chain metadata needed by the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProfile {
    pub id: ChainId,
    pub name: String,
    /// Staking eras elapsing per calendar day (1 for 24h eras, 4 for 6h eras).
    pub eras_per_day: u32,
}

impl ChainProfile {
    pub fn new(id: ChainId, name: impl Into<String>, eras_per_day: u32) -> Self {
        Self {
            id,
            name: name.into(),
            eras_per_day,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.eras_per_day == 0 {
            return Err(CalculatorError::InvalidConfiguration(format!(
                "chain {} has zero eras per day",
                self.name
            )));
        }

        Ok(())
    }
}
