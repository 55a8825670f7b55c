pub mod reward_calculator_service;

pub use reward_calculator_service::{RewardCalculatorService, ServiceStatus};
