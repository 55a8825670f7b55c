use std::sync::Arc;

use crate::engine::inflation::InflationModel;
use crate::engine::statistics::ValidatorStatistics;
use crate::models::chain::AccountId;
use crate::models::exposure::{StakeKind, ValidatorExposure};
use crate::models::period::{CalculationPeriod, RewardReturnKind, DAYS_IN_YEAR};
use crate::models::snapshot::ChainStateSnapshot;
use crate::utils::errors::{CalculatorError, Result};

/// Network-wide inputs of the per-validator yield, computed once per call.
#[derive(Debug, Clone, Copy)]
struct ValidatorYieldBasis {
    annual_inflation: f64,
    average_stake: f64,
    staked_portion: f64,
}

/// Staking yield projections over one chain state snapshot.
///
/// The engine never mutates its snapshot and can be shared between threads.
#[derive(Debug, Clone)]
pub struct RewardCalculatorEngine {
    snapshot: Arc<ChainStateSnapshot>,
    inflation: InflationModel,
    eras_per_day: u32,
}

impl RewardCalculatorEngine {
    pub fn new(
        snapshot: Arc<ChainStateSnapshot>,
        inflation: InflationModel,
        eras_per_day: u32,
    ) -> Result<Self> {
        if eras_per_day == 0 {
            return Err(CalculatorError::InvalidConfiguration(
                "eras_per_day must be positive".to_string(),
            ));
        }

        Ok(Self {
            snapshot,
            inflation,
            eras_per_day,
        })
    }

    pub fn snapshot(&self) -> &Arc<ChainStateSnapshot> {
        &self.snapshot
    }

    pub fn eras_per_day(&self) -> u32 {
        self.eras_per_day
    }

    fn validators(&self) -> &[ValidatorExposure] {
        self.snapshot.validators()
    }

    /// Projected reward (excluding principal) for staking `amount`.
    ///
    /// With `validator` set the yield of that validator net of its commission
    /// is used, otherwise the network-wide average yield net of the median
    /// commission. An unknown validator yields zero.
    pub fn calculate_for_nominator(
        &self,
        amount: f64,
        validator: Option<&AccountId>,
        is_compound: bool,
        period: CalculationPeriod,
    ) -> Result<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CalculatorError::InvalidAmount(amount));
        }

        let annual_rate = match validator {
            Some(account) => {
                let basis = self.validator_yield_basis()?;

                match self.find_validator(account) {
                    Some(exposure) => {
                        let commission = exposure.commission_fraction();
                        Self::validator_rate(&basis, exposure)? * (1.0 - commission)
                    }
                    None => return Ok(0.0),
                }
            }
            None => self.average_annual_rate()?,
        };

        self.project(amount, annual_rate, is_compound, period)
    }

    /// Annual yield of the validator with the given account. Zero if the
    /// account is not in the elected set.
    pub fn calculate_for_validator(&self, account: &AccountId) -> Result<f64> {
        let basis = self.validator_yield_basis()?;

        match self.find_validator(account) {
            Some(exposure) => Self::validator_rate(&basis, exposure),
            None => Ok(0.0),
        }
    }

    pub fn calculate_return(
        &self,
        kind: RewardReturnKind,
        is_compound: bool,
        period: CalculationPeriod,
    ) -> Result<f64> {
        match kind {
            RewardReturnKind::Max => self.calculate_max_return(is_compound, period),
            RewardReturnKind::Avg => self.calculate_avg_return(is_compound, period),
        }
    }

    /// Per-unit reward when staking with the best validator.
    pub fn calculate_max_return(
        &self,
        is_compound: bool,
        period: CalculationPeriod,
    ) -> Result<f64> {
        let (_, annual_rate) = self.best_validator()?;
        self.project(1.0, annual_rate, is_compound, period)
    }

    /// Per-unit reward at the network-wide average rate.
    pub fn calculate_avg_return(
        &self,
        is_compound: bool,
        period: CalculationPeriod,
    ) -> Result<f64> {
        self.calculate_for_nominator(1.0, None, is_compound, period)
    }

    /// Validator offering the highest yield net of commission.
    pub fn max_validator(&self) -> Result<&AccountId> {
        let (exposure, _) = self.best_validator()?;
        Ok(&exposure.account_id)
    }

    fn find_validator(&self, account: &AccountId) -> Option<&ValidatorExposure> {
        self.validators()
            .iter()
            .find(|exposure| &exposure.account_id == account)
    }

    fn average_annual_rate(&self) -> Result<f64> {
        let validators = self.validators();

        let total_stake = ValidatorStatistics::total_stake(validators, StakeKind::Total);
        let staked_fraction =
            ValidatorStatistics::staked_fraction(total_stake, self.snapshot.total_issuance())?;
        let annual_inflation = self.inflation.annual_inflation(staked_fraction)?;
        let average_stake = ValidatorStatistics::average_stake(validators, StakeKind::Total)?;

        let stake_part = annual_inflation * average_stake;
        let commission = ValidatorStatistics::median_commission(validators)?.deconstruct() as f64
            / 1_000_000f64;

        Ok(stake_part * (1.0 - commission))
    }

    fn validator_yield_basis(&self) -> Result<ValidatorYieldBasis> {
        let validators = self.validators();

        let total_stake = ValidatorStatistics::total_stake(validators, StakeKind::Own);
        let staked_portion =
            ValidatorStatistics::staked_fraction(total_stake, self.snapshot.total_issuance())?;
        let annual_inflation = self.inflation.annual_inflation(staked_portion)?;
        let average_stake = ValidatorStatistics::average_stake(validators, StakeKind::Own)?;

        Ok(ValidatorYieldBasis {
            annual_inflation,
            average_stake,
            staked_portion,
        })
    }

    fn validator_rate(basis: &ValidatorYieldBasis, exposure: &ValidatorExposure) -> Result<f64> {
        let denominator = basis.staked_portion * exposure.total_stake as f64;

        if denominator == 0.0 {
            return Err(CalculatorError::DegenerateStakeData {
                account: exposure.account_id.clone(),
            });
        }

        Ok(basis.annual_inflation * basis.average_stake / denominator)
    }

    fn best_validator(&self) -> Result<(&ValidatorExposure, f64)> {
        let basis = self.validator_yield_basis()?;
        let mut best: Option<(&ValidatorExposure, f64)> = None;

        for exposure in self.validators() {
            let commission = exposure.commission_fraction();
            let rate = Self::validator_rate(&basis, exposure)? * (1.0 - commission);

            if best.map_or(true, |(_, best_rate)| rate > best_rate) {
                best = Some((exposure, rate));
            }
        }

        best.ok_or(CalculatorError::EmptyValidatorSet)
    }

    fn project(
        &self,
        amount: f64,
        annual_rate: f64,
        is_compound: bool,
        period: CalculationPeriod,
    ) -> Result<f64> {
        let daily_rate = annual_rate / DAYS_IN_YEAR as f64;
        let days = period.days() as f64;

        let reward = if is_compound {
            // One compounding event per era.
            let eras_per_day = self.eras_per_day as f64;
            amount * (1.0 + daily_rate / eras_per_day).powf(eras_per_day * days) - amount
        } else {
            amount * daily_rate * days
        };

        if !reward.is_finite() {
            return Err(CalculatorError::NonFiniteResult(reward));
        }

        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chain::{Balance, ChainId, Permill};

    fn account(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    fn exposure(
        byte: u8,
        own: Balance,
        total: Balance,
        commission_percent: u32,
    ) -> ValidatorExposure {
        ValidatorExposure::new(
            account(byte),
            own,
            total,
            Permill::from_percent(commission_percent),
        )
        .unwrap()
    }

    fn engine(
        total_issuance: Balance,
        validators: Vec<ValidatorExposure>,
        eras_per_day: u32,
    ) -> RewardCalculatorEngine {
        let snapshot = ChainStateSnapshot::new(
            ChainId::from_genesis([1; 32]),
            10,
            1,
            total_issuance,
            validators,
        );
        RewardCalculatorEngine::new(Arc::new(snapshot), InflationModel::default(), eras_per_day)
            .unwrap()
    }

    fn sample_engine(eras_per_day: u32) -> RewardCalculatorEngine {
        engine(
            10_000,
            vec![
                exposure(1, 100, 2_000, 10),
                exposure(2, 300, 3_000, 5),
                exposure(3, 200, 2_500, 20),
            ],
            eras_per_day,
        )
    }

    #[test]
    fn rejects_zero_eras_per_day() {
        let snapshot = ChainStateSnapshot::new(ChainId::from_genesis([1; 32]), 0, 1, 1, vec![]);
        let result = RewardCalculatorEngine::new(Arc::new(snapshot), InflationModel::default(), 0);
        assert!(matches!(result, Err(CalculatorError::InvalidConfiguration(_))));
    }

    #[test]
    fn simple_nominator_reward_at_ideal_stake() {
        // x = 0.75: inflation 0.075, average stake 0.75, no commission
        let engine = engine(1_000_000, vec![exposure(1, 0, 750_000, 0)], 1);
        let per_unit = engine
            .calculate_for_nominator(1.0, None, false, CalculationPeriod::Year)
            .unwrap();

        let expected = 0.075 * 750_000.0;
        assert!((per_unit - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn simple_reward_scales_with_days() {
        let engine = sample_engine(1);
        let day = engine
            .calculate_for_nominator(100.0, None, false, CalculationPeriod::Day)
            .unwrap();
        let month = engine
            .calculate_for_nominator(100.0, None, false, CalculationPeriod::Month)
            .unwrap();
        assert!((month - day * 30.0).abs() < 1e-6 * month);
    }

    #[test]
    fn median_commission_reduces_pooled_rate() {
        let without = engine(10_000, vec![exposure(1, 100, 2_000, 0)], 1);
        let with = engine(10_000, vec![exposure(1, 100, 2_000, 50)], 1);

        let a = without
            .calculate_for_nominator(1.0, None, false, CalculationPeriod::Year)
            .unwrap();
        let b = with
            .calculate_for_nominator(1.0, None, false, CalculationPeriod::Year)
            .unwrap();
        assert!((b * 2.0 - a).abs() < 1e-9 * a);
    }

    #[test]
    fn compound_exceeds_simple_after_first_day() {
        let engine = sample_engine(4);
        let amount = 0.001;

        for period in [
            CalculationPeriod::Month,
            CalculationPeriod::Year,
            CalculationPeriod::Custom(2),
        ] {
            let simple = engine
                .calculate_for_nominator(amount, Some(&account(1)), false, period)
                .unwrap();
            let compound = engine
                .calculate_for_nominator(amount, Some(&account(1)), true, period)
                .unwrap();
            assert!(compound > simple, "{period:?}: {compound} <= {simple}");
        }
    }

    #[test]
    fn compound_matches_simple_for_single_day() {
        let daily = sample_engine(1);
        let simple = daily
            .calculate_for_nominator(50.0, Some(&account(2)), false, CalculationPeriod::Day)
            .unwrap();
        let compound = daily
            .calculate_for_nominator(50.0, Some(&account(2)), true, CalculationPeriod::Day)
            .unwrap();
        assert!((simple - compound).abs() < 1e-9);

        // Several eras per day: only the intra-day compounding differs.
        let quarterly = sample_engine(4);
        let compound = quarterly
            .calculate_for_nominator(50.0, Some(&account(2)), true, CalculationPeriod::Day)
            .unwrap();
        assert!(compound >= simple);
        assert!((compound - simple) / simple < 1e-3);
    }

    #[test]
    fn validator_yield() {
        let engine = sample_engine(1);
        let validator = engine.calculate_for_validator(&account(2)).unwrap();

        // own total 600 of 10_000 issuance
        let staked_portion = 0.06;
        let inflation = InflationModel::default().annual_inflation(staked_portion).unwrap();
        let expected = inflation * 200.0 / (staked_portion * 3_000.0);
        assert!((validator - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_validator_yields_zero() {
        let engine = sample_engine(1);
        assert_eq!(engine.calculate_for_validator(&account(9)).unwrap(), 0.0);
        assert_eq!(
            engine
                .calculate_for_nominator(10.0, Some(&account(9)), true, CalculationPeriod::Year)
                .unwrap(),
            0.0
        );
    }

    #[test]
    fn targeted_nominator_uses_validator_commission() {
        let engine = sample_engine(1);
        let validator_rate = engine.calculate_for_validator(&account(3)).unwrap();
        let reward = engine
            .calculate_for_nominator(1.0, Some(&account(3)), false, CalculationPeriod::Year)
            .unwrap();
        assert!((reward - validator_rate * 0.8).abs() < 1e-12);
    }

    #[test]
    fn max_return_picks_best_validator() {
        let engine = sample_engine(1);

        let best = engine.max_validator().unwrap().clone();
        let max = engine.calculate_max_return(false, CalculationPeriod::Year).unwrap();

        for byte in 1..=3 {
            let reward = engine
                .calculate_for_nominator(1.0, Some(&account(byte)), false, CalculationPeriod::Year)
                .unwrap();
            assert!(reward <= max + 1e-12);
        }

        let best_reward = engine
            .calculate_for_nominator(1.0, Some(&best), false, CalculationPeriod::Year)
            .unwrap();
        assert!((best_reward - max).abs() < 1e-12);
    }

    #[test]
    fn avg_return_is_per_unit_pooled_reward() {
        let engine = sample_engine(1);
        let avg = engine.calculate_avg_return(true, CalculationPeriod::Month).unwrap();
        let pooled = engine
            .calculate_for_nominator(1.0, None, true, CalculationPeriod::Month)
            .unwrap();
        assert_eq!(avg, pooled);
    }

    #[test]
    fn empty_validator_set_is_an_error() {
        let engine = engine(1_000, vec![], 1);
        assert_eq!(
            engine.calculate_for_nominator(1.0, None, false, CalculationPeriod::Day),
            Err(CalculatorError::EmptyValidatorSet)
        );
        assert_eq!(
            engine.calculate_for_validator(&account(1)),
            Err(CalculatorError::EmptyValidatorSet)
        );
        assert_eq!(engine.max_validator(), Err(CalculatorError::EmptyValidatorSet));
    }

    #[test]
    fn zero_issuance_is_an_error() {
        let engine = engine(0, vec![exposure(1, 1, 1, 0)], 1);
        assert_eq!(
            engine.calculate_for_nominator(1.0, None, false, CalculationPeriod::Day),
            Err(CalculatorError::ZeroTotalIssuance)
        );
    }

    #[test]
    fn targeted_nominator_shares_validator_error_policy() {
        let empty = engine(1_000, vec![], 1);
        assert_eq!(
            empty.calculate_for_nominator(1.0, Some(&account(9)), false, CalculationPeriod::Day),
            Err(CalculatorError::EmptyValidatorSet)
        );
        assert_eq!(
            empty.calculate_for_validator(&account(9)),
            Err(CalculatorError::EmptyValidatorSet)
        );

        let no_issuance = engine(0, vec![exposure(1, 1, 1, 0)], 1);
        assert_eq!(
            no_issuance.calculate_for_nominator(
                1.0,
                Some(&account(9)),
                false,
                CalculationPeriod::Day
            ),
            Err(CalculatorError::ZeroTotalIssuance)
        );
        assert_eq!(
            no_issuance.calculate_for_validator(&account(9)),
            Err(CalculatorError::ZeroTotalIssuance)
        );
    }

    #[test]
    fn compound_overflow_is_an_error() {
        // Pooled rate at x = 0.75 is 56_250 per unit per year.
        let engine = engine(1_000_000, vec![exposure(1, 0, 750_000, 0)], 1);

        let result = engine.calculate_for_nominator(1.0, None, true, CalculationPeriod::Year);
        assert!(matches!(result, Err(CalculatorError::NonFiniteResult(_))));

        let result = engine.calculate_avg_return(true, CalculationPeriod::Year);
        assert!(matches!(result, Err(CalculatorError::NonFiniteResult(_))));

        // Same rate without compounding stays finite.
        assert!(engine
            .calculate_for_nominator(1.0, None, false, CalculationPeriod::Year)
            .is_ok());
    }

    #[test]
    fn return_kind_dispatches_to_max_and_avg() {
        let engine = sample_engine(1);
        let period = CalculationPeriod::Month;

        assert_eq!(
            engine.calculate_return(RewardReturnKind::Max, false, period),
            engine.calculate_max_return(false, period)
        );
        assert_eq!(
            engine.calculate_return(RewardReturnKind::Avg, true, period),
            engine.calculate_avg_return(true, period)
        );
    }

    #[test]
    fn zero_own_stake_is_degenerate_for_validator_yield() {
        let engine = engine(1_000, vec![exposure(1, 0, 100, 0)], 1);
        assert_eq!(
            engine.calculate_for_validator(&account(1)),
            Err(CalculatorError::DegenerateStakeData { account: account(1) })
        );
    }

    #[test]
    fn stake_above_issuance_is_rejected() {
        let engine = engine(100, vec![exposure(1, 0, 500, 0)], 1);
        assert!(matches!(
            engine.calculate_for_nominator(1.0, None, false, CalculationPeriod::Day),
            Err(CalculatorError::StakedFractionOutOfRange(_))
        ));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let engine = sample_engine(1);
        assert_eq!(
            engine.calculate_for_nominator(-1.0, None, false, CalculationPeriod::Day),
            Err(CalculatorError::InvalidAmount(-1.0))
        );
    }
}
