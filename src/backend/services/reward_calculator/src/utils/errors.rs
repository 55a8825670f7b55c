use sp_core::crypto::AccountId32 as AccountId;
use thiserror::Error;

use crate::models::chain::ChainId;

/// Errors raised by the pure reward calculation code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("Validator set is empty")]
    EmptyValidatorSet,

    #[error("Total issuance is zero")]
    ZeroTotalIssuance,

    #[error("Degenerate stake data for validator {account}")]
    DegenerateStakeData { account: AccountId },

    #[error("Invalid exposure for validator {account}: {reason}")]
    InvalidExposure { account: AccountId, reason: String },

    #[error("Staked fraction out of range: {0}")]
    StakedFractionOutOfRange(f64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Projected reward is not finite: {0}")]
    NonFiniteResult(f64),
}

/// Errors surfaced by `RewardCalculatorService` to its callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewardCalculatorServiceError {
    #[error("Timed out waiting for chain state")]
    Timeout,

    #[error("Calculator result unexpectedly missing")]
    UnexpectedMissingResult,

    #[error("Reward calculator service stopped")]
    ServiceStopped,

    #[error("Chain {0} is not configured")]
    UnknownChain(ChainId),

    #[error("Calculation error: {0}")]
    Calculator(#[from] CalculatorError),
}

/// Failure to decode a raw storage value delivered by the chain subscription.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("SCALE decoding failed: {0}")]
    Scale(#[from] codec::Error),

    #[error("Trailing bytes after value: {0}")]
    TrailingBytes(usize),
}

pub type Result<T> = std::result::Result<T, CalculatorError>;
pub type ServiceResult<T> = std::result::Result<T, RewardCalculatorServiceError>;
