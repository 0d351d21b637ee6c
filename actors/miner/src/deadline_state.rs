// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use cid::multihash::Code;
use cid::Cid;
use fil_actors_runtime::runtime::Policy;
use fil_actors_runtime::{
    actor_error, ActorContext, ActorError, Array, AsActorError, AsActorErrors,
};
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;
use fvm_ipld_encoding::tuple::*;
use fvm_ipld_encoding::{Cbor, CborStore};
use fvm_shared::clock::{ChainEpoch, QuantSpec, NO_QUANTIZATION};
use fvm_shared::error::ExitCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    BitFieldQueue, DEADLINE_EXPIRATIONS_AMT_BITWIDTH, DEADLINE_FAULTS_AMT_BITWIDTH,
    DEADLINE_PARTITIONS_AMT_BITWIDTH,
};

/// Directory of the proving deadlines of one miner, one slot per challenge window of the
/// proving period. Slots reference stored [`Deadline`]s and are never empty.
///
/// A decoded directory is not trusted to have the right shape: every access checks the slot
/// count against the policy.
#[derive(Serialize_tuple, Deserialize_tuple, Debug, Clone, PartialEq, Eq)]
pub struct Deadlines {
    due: Vec<Cid>,
}

impl Deadlines {
    pub fn new(policy: &Policy, empty_deadline_cid: Cid) -> Self {
        Self { due: vec![empty_deadline_cid; policy.wpost_period_deadlines as usize] }
    }

    /// Stores a fresh empty deadline and points every slot at it.
    pub fn new_empty<BS: Blockstore>(policy: &Policy, store: &BS) -> Result<Self, ActorError> {
        let empty_deadline = Deadline::new(store)?;
        let empty_deadline_cid = store
            .put_cbor(&empty_deadline, Code::Blake2b256)
            .or_illegal_state("failed to store empty deadline")?;
        Ok(Self::new(policy, empty_deadline_cid))
    }

    /// Builds a directory from explicit slots, one per deadline of the proving period.
    pub fn from_slots(policy: &Policy, due: Vec<Cid>) -> Result<Self, ActorError> {
        if due.len() as u64 != policy.wpost_period_deadlines {
            return Err(actor_error!(
                illegal_argument,
                "expected {} deadline slots, got {}",
                policy.wpost_period_deadlines,
                due.len()
            ));
        }
        Ok(Self { due })
    }

    /// Cids of the stored deadlines, in index order.
    pub fn due(&self) -> &[Cid] {
        &self.due
    }

    fn slot(&self, policy: &Policy, deadline_idx: u64) -> Result<usize, ActorError> {
        if deadline_idx >= policy.wpost_period_deadlines {
            return Err(actor_error!(illegal_argument, "invalid deadline {}", deadline_idx));
        }
        if self.due.len() as u64 != policy.wpost_period_deadlines {
            return Err(actor_error!(
                illegal_state,
                "deadline directory has {} slots, expected {}",
                self.due.len(),
                policy.wpost_period_deadlines
            ));
        }
        Ok(deadline_idx as usize)
    }

    pub fn load_deadline<BS: Blockstore>(
        &self,
        policy: &Policy,
        store: &BS,
        deadline_idx: u64,
    ) -> Result<Deadline, ActorError> {
        let slot = self.slot(policy, deadline_idx)?;

        store
            .get_cbor(&self.due[slot])
            .or_with_illegal_state(|| format!("failed to lookup deadline {}", deadline_idx))?
            .with_context_code(ExitCode::USR_ILLEGAL_STATE, || {
                format!(
                    "failed to lookup deadline {}: block {} not found",
                    deadline_idx, self.due[slot]
                )
            })
    }

    /// Loads each deadline in ascending index order and passes it to `f`.
    /// Stops at the first error, whether from loading or from the callback.
    pub fn for_each<BS: Blockstore>(
        &self,
        policy: &Policy,
        store: &BS,
        mut f: impl FnMut(u64, Deadline) -> Result<(), ActorError>,
    ) -> Result<(), ActorError> {
        for i in 0..policy.wpost_period_deadlines {
            let deadline = self.load_deadline(policy, store, i)?;
            f(i, deadline)?;
        }
        Ok(())
    }

    pub fn update_deadline<BS: Blockstore>(
        &mut self,
        policy: &Policy,
        store: &BS,
        deadline_idx: u64,
        deadline: &Deadline,
    ) -> Result<(), ActorError> {
        let slot = self.slot(policy, deadline_idx)?;

        let deadline_cid = store
            .put_cbor(deadline, Code::Blake2b256)
            .or_with_illegal_state(|| format!("failed to store deadline {}", deadline_idx))?;
        log::debug!("deadline {} updated to {}", deadline_idx, deadline_cid);
        self.due[slot] = deadline_cid;

        Ok(())
    }
}

impl Cbor for Deadlines {}

/// Deadline holds the state for all sectors due at a specific deadline.
#[derive(Debug, Clone, PartialEq, Serialize_tuple, Deserialize_tuple)]
pub struct Deadline {
    /// Partitions in this deadline, in order.
    /// The keys of this AMT are always sequential integers beginning with zero.
    pub partitions: Cid, // AMT[PartitionNumber]Partition

    /// Partitions added since the last proving period boundary. They are merged into
    /// `partitions`, and renumbered, when the period ends.
    pub pending_partitions: Cid, // AMT[PartitionNumber]Partition

    /// Partitions that have submitted a proof in the current proving period.
    pub post_submissions: BitField,

    /// The number of non-terminated sectors in this deadline (incl faulty),
    /// excluding pending sectors.
    pub active_sectors: u64,

    /// Maps epochs to partitions that have faulty sectors declared at that epoch.
    pub faults_epochs: Cid, // AMT[ChainEpoch]BitField

    /// Maps epochs to partitions that _may_ have sectors that expire in or
    /// before that epoch, either on-time or early as faults.
    /// Keys are quantized to final epochs in each proving deadline.
    ///
    /// NOTE: Partitions MUST NOT be removed from this queue (until the
    /// associated epoch has passed) even if they no longer have sectors
    /// expiring at that epoch. Sectors expiring at this epoch may later be
    /// recovered, and this queue will not be updated at that time.
    pub expirations_epochs: Cid, // AMT[ChainEpoch]BitField
}

impl Cbor for Deadline {}

impl Deadline {
    pub fn new<BS: Blockstore>(store: &BS) -> Result<Self, ActorError> {
        let empty_partitions_array =
            Array::<(), BS>::new_with_bit_width(store, DEADLINE_PARTITIONS_AMT_BITWIDTH)
                .flush()
                .context("failed to create empty partitions array")?;
        let empty_faults_array =
            Array::<BitField, BS>::new_with_bit_width(store, DEADLINE_FAULTS_AMT_BITWIDTH)
                .flush()
                .context("failed to create empty faults queue")?;
        let empty_expirations_array =
            Array::<BitField, BS>::new_with_bit_width(store, DEADLINE_EXPIRATIONS_AMT_BITWIDTH)
                .flush()
                .context("failed to create empty expirations queue")?;

        Ok(Self {
            partitions: empty_partitions_array,
            pending_partitions: empty_partitions_array,
            post_submissions: BitField::new(),
            active_sectors: 0,
            faults_epochs: empty_faults_array,
            expirations_epochs: empty_expirations_array,
        })
    }

    /// Constructs a deadline whose collections all reference one already stored empty array.
    pub fn with_empty_array(empty_array_cid: Cid) -> Self {
        Self {
            partitions: empty_array_cid,
            pending_partitions: empty_array_cid,
            post_submissions: BitField::new(),
            active_sectors: 0,
            faults_epochs: empty_array_cid,
            expirations_epochs: empty_array_cid,
        }
    }

    /// Loads the partitions of this deadline, keyed by partition number.
    pub fn partitions_array<'db, V, BS>(
        &self,
        store: &'db BS,
    ) -> Result<Array<'db, V, BS>, ActorError>
    where
        V: DeserializeOwned + Serialize,
        BS: Blockstore,
    {
        Array::load(&self.partitions, store).context("failed to load partitions")
    }

    /// Loads the partitions added since the last proving period boundary.
    pub fn pending_partitions_array<'db, V, BS>(
        &self,
        store: &'db BS,
    ) -> Result<Array<'db, V, BS>, ActorError>
    where
        V: DeserializeOwned + Serialize,
        BS: Blockstore,
    {
        Array::load(&self.pending_partitions, store).context("failed to load pending partitions")
    }

    /// Adds some partition numbers to the set expiring at an epoch.
    pub fn add_expiration_partitions<BS: Blockstore>(
        &mut self,
        store: &BS,
        expiration_epoch: ChainEpoch,
        partitions: &[u64],
        quant: QuantSpec,
    ) -> Result<(), ActorError> {
        // Avoid doing any work if there's nothing to reschedule.
        if partitions.is_empty() {
            return Ok(());
        }

        let mut queue = BitFieldQueue::new(store, &self.expirations_epochs, quant)
            .context("failed to load expiration queue")?;
        queue
            .add_to_queue_values(expiration_epoch, partitions.iter().copied())
            .context("failed to mutate expiration queue")?;
        self.expirations_epochs = queue.flush().context("failed to save expiration queue")?;

        Ok(())
    }

    /// PopExpiredPartitions removes all partitions from the expiration queue expiring at or
    /// before the given epoch and returns their union.
    pub fn pop_expired_partitions<BS: Blockstore>(
        &mut self,
        store: &BS,
        until: ChainEpoch,
    ) -> Result<BitField, ActorError> {
        let popped = pop_from_queue(store, &mut self.expirations_epochs, until)
            .context("failed to pop expired partitions")?;
        log::debug!("popped {} expired partitions until epoch {}", popped.len(), until);
        Ok(popped)
    }

    /// Records partitions with faults declared at the given epoch.
    pub fn add_fault_partitions<BS: Blockstore>(
        &mut self,
        store: &BS,
        fault_epoch: ChainEpoch,
        partitions: &BitField,
    ) -> Result<(), ActorError> {
        if partitions.is_empty() {
            return Ok(());
        }

        let mut queue = BitFieldQueue::new(store, &self.faults_epochs, NO_QUANTIZATION)
            .context("failed to load fault queue")?;
        queue.add_to_queue(fault_epoch, partitions).context("failed to mutate fault queue")?;
        self.faults_epochs = queue.flush().context("failed to save fault queue")?;

        Ok(())
    }

    /// Removes and returns the partitions with faults declared at or before the given epoch.
    pub fn pop_faulty_partitions<BS: Blockstore>(
        &mut self,
        store: &BS,
        until: ChainEpoch,
    ) -> Result<BitField, ActorError> {
        pop_from_queue(store, &mut self.faults_epochs, until)
            .context("failed to pop faulty partitions")
    }

    /// Marks partitions as proven for the current proving period.
    pub fn record_post_submissions(&mut self, partitions: &BitField) {
        self.post_submissions |= partitions;
    }

    /// Clears proof submissions at the end of a proving period.
    pub fn reset_post_submissions(&mut self) {
        self.post_submissions = BitField::new();
    }
}

// The root is replaced only once the popped entries have been deleted and the queue flushed.
fn pop_from_queue<BS: Blockstore>(
    store: &BS,
    root: &mut Cid,
    until: ChainEpoch,
) -> Result<BitField, ActorError> {
    let mut queue = BitFieldQueue::new(store, root, NO_QUANTIZATION)?;
    let (popped, modified) = queue.pop_until(until)?;
    if modified {
        *root = queue.flush()?;
    }
    Ok(popped)
}
