use crate::models::config::NetworkConstants;
use crate::utils::errors::{CalculatorError, Result};

/// NPoS inflation curve.
///
/// Below the ideal stake ratio inflation rises linearly from `minimal_inflation`
/// to `ideal_inflation`; above it, the excess inflation halves every
/// `decay_rate` of additional stake ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationModel {
    constants: NetworkConstants,
}

impl InflationModel {
    pub fn new(constants: NetworkConstants) -> Result<Self> {
        constants.validate()?;
        Ok(Self { constants })
    }

    pub fn constants(&self) -> &NetworkConstants {
        &self.constants
    }

    /// Annual inflation for the given staked fraction of total issuance.
    pub fn annual_inflation(&self, staked_fraction: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&staked_fraction) {
            return Err(CalculatorError::StakedFractionOutOfRange(staked_fraction));
        }

        let NetworkConstants {
            decay_rate,
            ideal_stake_portion,
            ideal_inflation,
            minimal_inflation,
        } = self.constants;

        let inflation = if staked_fraction <= ideal_stake_portion {
            minimal_inflation
                + staked_fraction * (ideal_inflation - minimal_inflation / ideal_stake_portion)
        } else {
            minimal_inflation
                + (ideal_inflation * ideal_stake_portion - minimal_inflation)
                    * 2f64.powf((ideal_stake_portion - staked_fraction) / decay_rate)
        };

        Ok(inflation)
    }
}

impl Default for InflationModel {
    fn default() -> Self {
        Self {
            constants: NetworkConstants::default(),
        }
    }
}
