// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fil_actors_runtime::runtime::Policy;
use fil_actors_runtime::{ActorError, Array, MessageAccumulator};
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;
use fvm_shared::clock::{ChainEpoch, QuantSpec};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{new_deadline_info, Deadline, Deadlines};

#[derive(Default, Debug)]
pub struct DeadlineStateSummary {
    pub partition_count: u64,
    pub pending_partition_count: u64,
    pub expiring_partitions: BitField,
    pub faulty_partitions: BitField,
    pub expiration_epochs: Vec<ChainEpoch>,
    pub fault_epochs: Vec<ChainEpoch>,
}

pub fn check_deadline_state_invariants<BS: Blockstore>(
    deadline: &Deadline,
    store: &BS,
    quant: QuantSpec,
    acc: &MessageAccumulator,
) -> DeadlineStateSummary {
    let mut summary = DeadlineStateSummary {
        partition_count: check_partition_keys(
            deadline.partitions_array(store),
            "partitions",
            acc,
        ),
        pending_partition_count: check_partition_keys(
            deadline.pending_partitions_array(store),
            "pending partitions",
            acc,
        ),
        ..Default::default()
    };

    match Array::<BitField, _>::load(&deadline.expirations_epochs, store) {
        Ok(expirations) => {
            let ret = expirations.for_each(|epoch, partitions| {
                let epoch = epoch as ChainEpoch;
                acc.require(
                    epoch >= 0,
                    format!("expiration queue key {} is not a valid epoch", epoch),
                );
                acc.require(
                    quant.quantize_up(epoch) == epoch,
                    format!("expiration queue key {} is not quantized", epoch),
                );
                acc.require(
                    !partitions.is_empty(),
                    format!("empty expiration queue entry at epoch {}", epoch),
                );
                summary.expiring_partitions |= partitions;
                summary.expiration_epochs.push(epoch);
                Ok(())
            });
            acc.require_no_error(ret, "error iterating expiration queue");
        }
        Err(e) => acc.add(format!("error loading expiration queue: {}", e)),
    }

    match Array::<BitField, _>::load(&deadline.faults_epochs, store) {
        Ok(faults) => {
            let ret = faults.for_each(|epoch, partitions| {
                let epoch = epoch as ChainEpoch;
                acc.require(epoch >= 0, format!("fault queue key {} is not a valid epoch", epoch));
                acc.require(
                    !partitions.is_empty(),
                    format!("empty fault queue entry at epoch {}", epoch),
                );
                summary.faulty_partitions |= partitions;
                summary.fault_epochs.push(epoch);
                Ok(())
            });
            acc.require_no_error(ret, "error iterating fault queue");
        }
        Err(e) => acc.add(format!("error loading fault queue: {}", e)),
    }

    summary
}

/// Checks the directory shape and the state of every deadline it references.
pub fn check_deadlines_invariants<BS: Blockstore>(
    policy: &Policy,
    deadlines: &Deadlines,
    store: &BS,
    proving_period_start: ChainEpoch,
    acc: &MessageAccumulator,
) -> Vec<DeadlineStateSummary> {
    let count = deadlines.due().len();
    if count as u64 != policy.wpost_period_deadlines {
        acc.add(format!(
            "deadline count {} does not match period deadlines {}",
            count, policy.wpost_period_deadlines
        ));
        return Vec::new();
    }

    let mut summaries = Vec::new();
    for idx in 0..policy.wpost_period_deadlines {
        match deadlines.load_deadline(policy, store, idx) {
            Ok(deadline) => {
                let quant = new_deadline_info(policy, proving_period_start, idx, 0).quant_spec();
                let dl_acc = acc.with_prefix(format!("deadline {}: ", idx));
                summaries.push(check_deadline_state_invariants(&deadline, store, quant, &dl_acc));
            }
            Err(e) => acc.add(format!("failed to load deadline {}: {}", idx, e)),
        }
    }
    summaries
}

// Partition contents are not inspected here, only their keys.
struct AnyPartition;

impl Serialize for AnyPartition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

impl<'de> Deserialize<'de> for AnyPartition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer).map(|_| AnyPartition)
    }
}

// Partition numbers must run 0, 1, 2, ... without gaps. Returns the number of partitions.
fn check_partition_keys<BS: Blockstore>(
    partitions: Result<Array<'_, AnyPartition, BS>, ActorError>,
    name: &str,
    acc: &MessageAccumulator,
) -> u64 {
    let partitions = match partitions {
        Ok(partitions) => partitions,
        Err(e) => {
            acc.add(format!("error loading {}: {}", name, e));
            return 0;
        }
    };

    let mut expected = 0;
    let ret = partitions.for_each(|key, _| {
        acc.require(
            key == expected,
            format!("{} key {} out of sequence, expected {}", name, key, expected),
        );
        expected = key + 1;
        Ok(())
    });
    acc.require_no_error(ret, format!("error iterating {}", name));
    expected
}
