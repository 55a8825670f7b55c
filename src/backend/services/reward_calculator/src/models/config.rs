use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::models::chain::{ChainId, ChainProfile};
use crate::utils::errors::CalculatorError;

/// Parameters of the NPoS inflation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConstants {
    /// Falloff of inflation above the ideal stake, per unit of stake ratio.
    pub decay_rate: f64,
    pub ideal_stake_portion: f64,
    pub ideal_inflation: f64,
    pub minimal_inflation: f64,
}

impl Default for NetworkConstants {
    fn default() -> Self {
        Self {
            decay_rate: 0.05,
            ideal_stake_portion: 0.75,
            ideal_inflation: 0.10,
            minimal_inflation: 0.025,
        }
    }
}

impl NetworkConstants {
    pub fn validate(&self) -> Result<(), CalculatorError> {
        let fractions = [
            ("decay_rate", self.decay_rate),
            ("ideal_stake_portion", self.ideal_stake_portion),
            ("ideal_inflation", self.ideal_inflation),
            ("minimal_inflation", self.minimal_inflation),
        ];

        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(CalculatorError::InvalidConfiguration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.ideal_stake_portion == 0.0 {
            return Err(CalculatorError::InvalidConfiguration(
                "ideal_stake_portion must be positive".to_string(),
            ));
        }

        if self.decay_rate == 0.0 {
            return Err(CalculatorError::InvalidConfiguration(
                "decay_rate must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for the reward calculator service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Default wait for chain state in `fetch_calculator_default`
    pub default_timeout_ms: u64,
    /// Inflation curve parameters
    #[serde(default)]
    pub constants: NetworkConstants,
    /// Known chains
    #[serde(default)]
    pub chains: Vec<ChainProfile>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 20_000,
            constants: NetworkConstants::default(),
            chains: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config = toml::from_str::<ServiceConfig>(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), CalculatorError> {
        self.constants.validate()?;

        for chain in &self.chains {
            chain.validate()?;
        }

        Ok(())
    }

    pub fn chain(&self, id: ChainId) -> Option<&ChainProfile> {
        self.chains.iter().find(|chain| chain.id == id)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
