use serde::{Deserialize, Serialize};

pub const DAYS_IN_YEAR: u32 = 365;
pub const DAYS_IN_MONTH: u32 = 30;

/// Projection horizon. Months and years use a fixed day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationPeriod {
    Day,
    Month,
    Year,
    Custom(u32),
}

impl CalculationPeriod {
    pub fn days(&self) -> u32 {
        match self {
            Self::Day => 1,
            Self::Month => DAYS_IN_MONTH,
            Self::Year => DAYS_IN_YEAR,
            Self::Custom(days) => *days,
        }
    }
}

/// Which per-unit return to project: best validator or network average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardReturnKind {
    Max,
    Avg,
}
