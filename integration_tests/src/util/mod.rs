use fil_actor_miner::testing::{check_deadlines_invariants, DeadlineStateSummary};
use fil_actor_miner::{new_deadline_info_from_offset_and_epoch, DeadlineInfo, Deadlines};
use fil_actor_reward::testing::check_state_invariants;
use fil_actor_reward::{BaselineCurve, State};
use fil_actors_runtime::runtime::Policy;
use fil_actors_runtime::{ActorError, MessageAccumulator};
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::sector::StoragePower;

/// Advances the reward state by one epoch and asserts its invariants.
pub fn advance_reward(st: &mut State, curve: &impl BaselineCurve, power: &StoragePower) {
    let prior_epoch = st.epoch;
    st.update_to_next_epoch_with_reward(curve, power).unwrap();
    let (_, acc) = check_state_invariants(st, prior_epoch);
    acc.assert_empty();
}

/// Deadline info for `epoch` when it is the last epoch of its challenge window.
pub fn closing_deadline(
    policy: &Policy,
    proving_period_start: ChainEpoch,
    epoch: ChainEpoch,
) -> Option<DeadlineInfo> {
    let info = new_deadline_info_from_offset_and_epoch(policy, proving_period_start, epoch);
    (info.last() == epoch).then_some(info)
}

/// Pops the expirations due at the close of a deadline and persists the deadline when anything
/// was popped. The directory is left untouched on error.
pub fn process_deadline_close<BS: Blockstore>(
    policy: &Policy,
    store: &BS,
    deadlines: &mut Deadlines,
    info: &DeadlineInfo,
) -> Result<BitField, ActorError> {
    let mut deadline = deadlines.load_deadline(policy, store, info.index)?;
    let expired = deadline.pop_expired_partitions(store, info.last())?;
    if !expired.is_empty() {
        deadlines.update_deadline(policy, store, info.index, &deadline)?;
        log::debug!("deadline {} expired partitions {:?}", info.index, expired);
    }
    Ok(expired)
}

pub fn assert_deadlines_invariants<BS: Blockstore>(
    policy: &Policy,
    deadlines: &Deadlines,
    store: &BS,
    proving_period_start: ChainEpoch,
) -> Vec<DeadlineStateSummary> {
    let acc = MessageAccumulator::default();
    let summaries =
        check_deadlines_invariants(policy, deadlines, store, proving_period_start, &acc);
    acc.assert_empty();
    summaries
}
