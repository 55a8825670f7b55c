use crate::models::chain::{AccountId, Balance, Permill};
use crate::utils::errors::{CalculatorError, Result};

/// Stake backing a single elected validator in an era.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorExposure {
    pub account_id: AccountId,
    pub own_stake: Balance,
    /// Own stake plus nominator stake.
    pub total_stake: Balance,
    /// Saturates at 100% by construction.
    pub commission: Permill,
}

/// Which stake field to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeKind {
    Own,
    Total,
}

impl ValidatorExposure {
    pub fn new(
        account_id: AccountId,
        own_stake: Balance,
        total_stake: Balance,
        commission: Permill,
    ) -> Result<Self> {
        let exposure = Self {
            account_id,
            own_stake,
            total_stake,
            commission,
        };
        exposure.validate()?;
        Ok(exposure)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_stake < self.own_stake {
            return Err(CalculatorError::InvalidExposure {
                account: self.account_id.clone(),
                reason: format!(
                    "total stake {} below own stake {}",
                    self.total_stake, self.own_stake
                ),
            });
        }

        Ok(())
    }

    pub fn stake(&self, kind: StakeKind) -> Balance {
        match kind {
            StakeKind::Own => self.own_stake,
            StakeKind::Total => self.total_stake,
        }
    }

    /// Commission as a fraction in `[0, 1]`.
    pub fn commission_fraction(&self) -> f64 {
        self.commission.deconstruct() as f64 / 1_000_000f64
    }
}
