use crate::State;
use fil_actors_runtime::MessageAccumulator;
use fvm_shared::bigint::BigInt;
use fvm_shared::clock::ChainEpoch;
use num_traits::Signed;

/// Where the network stands on the emission curve after the checked epoch.
#[derive(Default, Debug)]
pub struct StateSummary {
    pub epoch: ChainEpoch,
    pub effective_network_time: ChainEpoch,
    pub reward: BigInt,
}

pub fn check_state_invariants(
    state: &State,
    prior_epoch: ChainEpoch,
) -> (StateSummary, MessageAccumulator) {
    let acc = MessageAccumulator::default();

    acc.require(
        state.epoch == prior_epoch + 1,
        format!(
            "reward state epoch {} does not match prior_epoch+1 {}",
            state.epoch,
            prior_epoch + 1
        ),
    );
    // Network time may run one epoch ahead: the baseline for epoch 0 is reached at time 1.
    acc.require(
        state.effective_network_time <= state.epoch + 1,
        format!(
            "effective network time {} greater than state epoch {} + 1",
            state.effective_network_time, state.epoch
        ),
    );
    if state.epoch >= 0 {
        acc.require(
            state.this_epoch_baseline_power.is_positive(),
            format!("baseline power {} not positive", state.this_epoch_baseline_power),
        );
    }

    acc.require(
        state.cumsum_realized <= state.cumsum_baseline,
        format!(
            "cumsum realized {} > cumsum baseline {}",
            state.cumsum_realized, state.cumsum_baseline
        ),
    );
    acc.require(
        !state.cumsum_realized.is_negative(),
        format!("cumsum realized negative ({})", state.cumsum_realized),
    );
    acc.require(
        !state.this_epoch_reward.is_negative(),
        format!("this epoch reward negative ({})", state.this_epoch_reward),
    );

    let summary = StateSummary {
        epoch: state.epoch,
        effective_network_time: state.effective_network_time,
        reward: state.this_epoch_reward.clone(),
    };
    (summary, acc)
}
