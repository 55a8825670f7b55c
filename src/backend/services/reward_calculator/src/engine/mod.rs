pub mod calculator;
pub mod inflation;
pub mod statistics;

pub use calculator::RewardCalculatorEngine;
pub use inflation::InflationModel;
pub use statistics::ValidatorStatistics;
