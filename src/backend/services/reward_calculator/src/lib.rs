//! Staking reward calculator for NPoS chains.
//!
//! `engine` holds the pure yield maths over a [`models::snapshot::ChainStateSnapshot`];
//! `services` keeps the current snapshot up to date from a chain subscription
//! and hands out calculators to callers.

pub mod engine;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use engine::{InflationModel, RewardCalculatorEngine, ValidatorStatistics};
pub use services::{RewardCalculatorService, ServiceStatus};
pub use utils::errors::{CalculatorError, RewardCalculatorServiceError};
