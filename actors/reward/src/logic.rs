// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fil_actors_runtime::{require_state, ActorError, EXPECTED_LEADERS_PER_EPOCH};
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::math::PRECISION;
use fvm_shared::sector::StoragePower;
use fvm_shared::FILECOIN_PRECISION;
use lazy_static::lazy_static;
use num_traits::Signed;

use super::expneg::expneg;

lazy_static! {
    /// 2^40 bytes, the baseline power of the protocol's constant baseline curve.
    pub static ref BASELINE_POWER: StoragePower = StoragePower::from(1u64 << 40);

    /// 100M for the simple (exponentially decaying) emission
    pub static ref SIMPLE_TOTAL: BigInt = BigInt::from(100_000_000) * FILECOIN_PRECISION;
    /// 900M for the baseline (network time driven) emission
    pub static ref BASELINE_TOTAL: BigInt = BigInt::from(900_000_000) * FILECOIN_PRECISION;
    /// expLamSubOne = e^lambda - 1
    /// for Q.128: int(expLamSubOne * 2^128)
    static ref EXP_LAM_SUB_ONE: BigInt = BigInt::from(186857422238468211692840431007040u128);
    /// lambda = ln(2) / (6 * epochsInYear)
    /// for Q.128: int(lambda * 2^128)
    static ref LAMBDA: BigInt = BigInt::from(186857370934482378542986172834581u128);
}

/// Baseline power the network is expected to reach at each epoch.
///
/// Implementations must be deterministic, non-decreasing in the epoch and strictly positive
/// for non-negative epochs.
pub trait BaselineCurve {
    fn baseline_power_at(&self, epoch: ChainEpoch) -> StoragePower;
}

/// The current protocol curve: a flat baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBaseline(pub StoragePower);

impl Default for ConstantBaseline {
    fn default() -> Self {
        Self(BASELINE_POWER.clone())
    }
}

impl BaselineCurve for ConstantBaseline {
    fn baseline_power_at(&self, _epoch: ChainEpoch) -> StoragePower {
        self.0.clone()
    }
}

impl<F> BaselineCurve for F
where
    F: Fn(ChainEpoch) -> StoragePower,
{
    fn baseline_power_at(&self, epoch: ChainEpoch) -> StoragePower {
        self(epoch)
    }
}

/// Computes RewardTheta which is is precise fractional value of effectiveNetworkTime.
/// The effectiveNetworkTime is defined by CumsumBaselinePower(theta) == CumsumRealizedPower
/// As baseline power is defined over integers and the RewardTheta is required to be fractional,
/// we perform linear interpolation between CumsumBaseline(⌊theta⌋) and CumsumBaseline(⌈theta⌉).
/// The effectiveNetworkTime argument is ceiling of theta.
/// The result is a fractional effectiveNetworkTime (theta) in Q.128 format.
///
/// `baseline_power_at_effective_network_time` must be positive when the network time is.
pub fn compute_r_theta(
    effective_network_time: ChainEpoch,
    baseline_power_at_effective_network_time: &BigInt,
    cumsum_realized: &BigInt,
    cumsum_baseline: &BigInt,
) -> BigInt {
    if effective_network_time != 0 {
        let reward_theta = BigInt::from(effective_network_time) << PRECISION;
        let diff = ((cumsum_baseline - cumsum_realized) << PRECISION)
            / baseline_power_at_effective_network_time;

        reward_theta - diff
    } else {
        Default::default()
    }
}

/// Computes a reward for all expected leaders when effective network time changes
/// from prevTheta to currTheta. Inputs are in Q.128 format.
/// The result is the reward of a single leader, in attoFIL.
pub fn compute_reward(
    epoch: ChainEpoch,
    prev_theta: &BigInt,
    curr_theta: &BigInt,
) -> Result<TokenAmount, ActorError> {
    let mut simple_reward = &*SIMPLE_TOTAL * &*EXP_LAM_SUB_ONE;
    let epoch_lam = &*LAMBDA * epoch;

    simple_reward *= expneg(&epoch_lam);
    simple_reward >>= PRECISION;

    let baseline_reward = compute_baseline_supply(curr_theta) - compute_baseline_supply(prev_theta);
    require_state(
        !baseline_reward.is_negative(),
        format!(
            "baseline reward negative at epoch {}: theta went from {} to {}",
            epoch, prev_theta, curr_theta
        ),
    )?;

    Ok(((simple_reward + baseline_reward) / EXPECTED_LEADERS_PER_EPOCH) >> PRECISION)
}

/// Computes baseline supply based on theta in Q.128 format.
/// Return is in Q.128 format
pub fn compute_baseline_supply(theta: &BigInt) -> BigInt {
    let theta_lam = (theta * &*LAMBDA) >> PRECISION;

    let etl = expneg(&theta_lam);

    let one = BigInt::from(1) << PRECISION;
    let one_sub = one - etl;

    one_sub * &*BASELINE_TOTAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_shared::error::ExitCode;
    use num::BigRational;
    use num::ToPrimitive;
    use std::ops::Shl;

    // x => x/(2^128)
    fn q128_to_f64(x: BigInt) -> f64 {
        let denom = BigInt::from(1u64).shl(u128::BITS);
        BigRational::new(x, denom).to_f64().expect("BigInt cannot be expressed as a 64bit float")
    }

    fn baseline_power_at(epoch: ChainEpoch) -> BigInt {
        (BigInt::from(epoch) + BigInt::from(1i64)) * BigInt::from(2048)
    }

    #[test]
    fn test_compute_r_theta() {
        assert_eq!(
            q128_to_f64(compute_r_theta(
                1,
                &baseline_power_at(1),
                &BigInt::from(2048 + 2 * 2048 / 2),
                &BigInt::from(2048 + 2 * 2048),
            )),
            0.5
        );

        assert_eq!(
            q128_to_f64(compute_r_theta(
                1,
                &baseline_power_at(1),
                &BigInt::from(2048 + 2 * 2048 / 4),
                &BigInt::from(2048 + 2 * 2048),
            )),
            0.25
        );

        let cumsum15 = (0..16).map(baseline_power_at).sum::<BigInt>();
        assert_eq!(
            q128_to_f64(compute_r_theta(
                16,
                &baseline_power_at(16),
                &(&cumsum15 + baseline_power_at(16) / BigInt::from(4)),
                &(&cumsum15 + baseline_power_at(16)),
            )),
            15.25
        );
    }

    #[test]
    fn r_theta_is_zero_before_network_time_starts() {
        assert_eq!(
            BigInt::default(),
            compute_r_theta(0, &BigInt::default(), &BigInt::from(5), &BigInt::from(100))
        );
    }

    #[test]
    fn r_theta_truncates_toward_zero() {
        // 1 - 1/3 cannot be represented exactly; the subtracted term rounds down.
        let theta = compute_r_theta(1, &BigInt::from(3), &BigInt::from(2), &BigInt::from(3));
        let expected = (BigInt::from(1) << PRECISION) - (BigInt::from(1) << PRECISION) / 3;
        assert_eq!(expected, theta);
    }

    #[test]
    fn baseline_supply_at_reference_points() {
        assert_eq!(BigInt::default(), compute_baseline_supply(&BigInt::default()));
        assert_eq!(
            "168171587667463794214830204980558700000000000000000000000000"
                .parse::<BigInt>()
                .unwrap(),
            compute_baseline_supply(&(BigInt::from(1) << PRECISION))
        );
    }

    #[test]
    fn simple_reward_only_at_genesis() {
        let reward = compute_reward(0, &BigInt::default(), &BigInt::default()).unwrap();
        assert_eq!(BigInt::from(10982492212526712978u64), reward);
    }

    #[test]
    fn simple_reward_decays() {
        let zero = BigInt::default();
        let first = compute_reward(0, &zero, &zero).unwrap();
        let second = compute_reward(1, &zero, &zero).unwrap();
        let later = compute_reward(1_000_000, &zero, &zero).unwrap();
        assert_eq!(BigInt::from(10982486181773264703u64), second);
        assert!(second < first);
        assert!(later < second);
    }

    #[test]
    fn baseline_reward_grows_with_theta_delta() {
        let zero = BigInt::default();
        let one = BigInt::from(1) << PRECISION;
        let half = BigInt::from(1) << (PRECISION - 1);
        assert_eq!(
            "109824867848486095310".parse::<BigInt>().unwrap(),
            compute_reward(0, &zero, &one).unwrap()
        );
        assert_eq!(
            "60403686815102170660".parse::<BigInt>().unwrap(),
            compute_reward(0, &zero, &half).unwrap()
        );
    }

    #[test]
    fn backwards_theta_is_an_illegal_state() {
        let one = BigInt::from(1) << PRECISION;
        let err = compute_reward(0, &one, &BigInt::default()).unwrap_err();
        assert_eq!(ExitCode::USR_ILLEGAL_STATE, err.exit_code());
        assert!(err.msg().starts_with("baseline reward negative at epoch 0"));
    }

    #[test]
    fn constant_and_closure_curves() {
        let constant = ConstantBaseline::default();
        assert_eq!(BigInt::from(1u64 << 40), constant.baseline_power_at(0));
        assert_eq!(constant.baseline_power_at(0), constant.baseline_power_at(1_000_000));

        let linear = |epoch: ChainEpoch| baseline_power_at(epoch);
        assert_eq!(BigInt::from(2048 * 11), linear.baseline_power_at(10));
    }
}
