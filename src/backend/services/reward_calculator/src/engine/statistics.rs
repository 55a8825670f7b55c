use crate::models::chain::{Balance, Permill};
use crate::models::exposure::{StakeKind, ValidatorExposure};
use crate::utils::errors::{CalculatorError, Result};

/// Aggregates over an elected validator set.
pub struct ValidatorStatistics;

impl ValidatorStatistics {
    /// Sum of the selected stake field. Zero for an empty set.
    pub fn total_stake(validators: &[ValidatorExposure], kind: StakeKind) -> f64 {
        validators
            .iter()
            .map(|validator| validator.stake(kind) as f64)
            .sum()
    }

    pub fn average_stake(validators: &[ValidatorExposure], kind: StakeKind) -> Result<f64> {
        if validators.is_empty() {
            return Err(CalculatorError::EmptyValidatorSet);
        }

        Ok(Self::total_stake(validators, kind) / validators.len() as f64)
    }

    /// Median commission; the two middle values are averaged (truncating)
    /// for even-sized sets.
    pub fn median_commission(validators: &[ValidatorExposure]) -> Result<Permill> {
        if validators.is_empty() {
            return Err(CalculatorError::EmptyValidatorSet);
        }

        let mut parts: Vec<u32> = validators
            .iter()
            .map(|validator| validator.commission.deconstruct())
            .collect();
        parts.sort_unstable();

        let middle = parts.len() / 2;
        let median = if parts.len() % 2 == 1 {
            parts[middle]
        } else {
            ((parts[middle - 1] as u64 + parts[middle] as u64) / 2) as u32
        };

        Ok(Permill::from_parts(median))
    }

    pub fn staked_fraction(total_stake: f64, total_issuance: Balance) -> Result<f64> {
        if total_issuance == 0 {
            return Err(CalculatorError::ZeroTotalIssuance);
        }

        Ok(total_stake / total_issuance as f64)
    }
}
