// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fil_actors_runtime::{actor_error, require_state, ActorError};
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_encoding::Cbor;
use fvm_shared::bigint::bigint_ser;
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::{ChainEpoch, EPOCH_UNDEFINED};
use fvm_shared::econ::TokenAmount;
use fvm_shared::sector::{Spacetime, StoragePower};
use num_traits::{Signed, Zero};

use crate::logic::*;

/// Reward actor state
#[derive(Serialize_tuple, Deserialize_tuple, Default, Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Target CumsumRealized needs to reach for EffectiveNetworkTime to increase
    /// Expressed in byte-epochs.
    #[serde(with = "bigint_ser")]
    pub cumsum_baseline: Spacetime,

    /// CumsumRealized is cumulative sum of network power capped by BaselinePower(epoch).
    /// Expressed in byte-epochs.
    #[serde(with = "bigint_ser")]
    pub cumsum_realized: Spacetime,

    /// Ceiling of real effective network time `theta` based on
    /// CumsumBaselinePower(theta) == CumsumRealizedPower
    /// Theta captures the notion of how much the network has progressed in its baseline
    /// and in advancing network time.
    pub effective_network_time: ChainEpoch,

    /// The baseline power the network is targeting at st.Epoch.
    #[serde(with = "bigint_ser")]
    pub this_epoch_baseline_power: StoragePower,

    /// The reward to be paid in per WinCount to block producers.
    /// The actual reward total paid out depends on the number of winners in any round.
    /// This value is recomputed every non-null epoch and used in the next non-null epoch.
    #[serde(with = "bigint_ser")]
    pub this_epoch_reward: TokenAmount,

    /// Epoch tracks for which epoch the Reward was computed.
    pub epoch: ChainEpoch,
}

impl State {
    pub fn new() -> Self {
        Self { epoch: EPOCH_UNDEFINED, ..Default::default() }
    }

    /// Creates the state and advances it to epoch 0 with a reward for the given power.
    pub fn construct(
        curve: &impl BaselineCurve,
        curr_realized_power: &StoragePower,
    ) -> Result<Self, ActorError> {
        let mut st = Self::new();
        st.update_to_next_epoch_with_reward(curve, curr_realized_power)?;
        Ok(st)
    }

    /// Takes in current realized power and updates internal state
    /// Used for update of internal state during null rounds
    pub fn update_to_next_epoch(
        &mut self,
        curve: &impl BaselineCurve,
        curr_realized_power: &StoragePower,
    ) -> Result<(), ActorError> {
        if curr_realized_power.is_negative() {
            return Err(actor_error!(
                illegal_argument,
                "realized power {} must not be negative",
                curr_realized_power
            ));
        }

        self.epoch += 1;
        self.this_epoch_baseline_power = curve.baseline_power_at(self.epoch);
        let capped_realized_power =
            std::cmp::min(&self.this_epoch_baseline_power, curr_realized_power);
        self.cumsum_realized += capped_realized_power;

        let start = self.effective_network_time;
        while self.cumsum_realized > self.cumsum_baseline {
            self.effective_network_time += 1;
            self.cumsum_baseline += curve.baseline_power_at(self.effective_network_time);
        }
        if self.effective_network_time > start + 1 {
            log::trace!(
                "epoch {}: effective network time caught up from {} to {}",
                self.epoch,
                start,
                self.effective_network_time
            );
        }

        Ok(())
    }

    /// Advances one epoch and recomputes the per-leader reward from the change in
    /// effective network time.
    pub fn update_to_next_epoch_with_reward(
        &mut self,
        curve: &impl BaselineCurve,
        curr_realized_power: &StoragePower,
    ) -> Result<(), ActorError> {
        let prev_reward_theta = self.reward_theta(curve)?;
        let mut next = self.clone();
        next.update_to_next_epoch(curve, curr_realized_power)?;
        let curr_reward_theta = next.reward_theta(curve)?;

        next.this_epoch_reward =
            compute_reward(next.epoch, &prev_reward_theta, &curr_reward_theta)?;
        log::debug!("epoch {}: reward {}", next.epoch, next.this_epoch_reward);

        *self = next;
        Ok(())
    }

    /// Fractional effective network time in Q.128.
    pub fn reward_theta(&self, curve: &impl BaselineCurve) -> Result<BigInt, ActorError> {
        if self.effective_network_time == 0 {
            return Ok(BigInt::zero());
        }

        let baseline = curve.baseline_power_at(self.effective_network_time);
        require_state(
            baseline.is_positive(),
            format!(
                "baseline power {} at effective network time {} must be positive",
                baseline, self.effective_network_time
            ),
        )?;

        Ok(compute_r_theta(
            self.effective_network_time,
            &baseline,
            &self.cumsum_realized,
            &self.cumsum_baseline,
        ))
    }
}

impl Cbor for State {}
