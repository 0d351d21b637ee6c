// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::convert::TryInto;

use cid::Cid;
use fil_actors_runtime::{ActorContext, ActorError, Array};
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;
use fvm_shared::clock::{ChainEpoch, QuantSpec};

/// Wrapper for working with an AMT[ChainEpoch]*Bitfield functioning as a queue, bucketed by epoch.
/// Keys in the queue are quantized (upwards), modulo some offset, to reduce the cardinality of keys.
/// Entries are never empty: adding nothing is a no-op and popped keys are deleted.
pub struct BitFieldQueue<'db, BS> {
    pub amt: Array<'db, BitField, BS>,
    quant: QuantSpec,
}

impl<'db, BS: Blockstore> BitFieldQueue<'db, BS> {
    pub fn new(store: &'db BS, root: &Cid, quant: QuantSpec) -> Result<Self, ActorError> {
        let amt = Array::load(root, store)
            .with_context(|| format!("failed to load bitfield queue {}", root))?;
        Ok(Self { amt, quant })
    }

    /// Adds values to the queue entry for an epoch.
    pub fn add_to_queue(
        &mut self,
        raw_epoch: ChainEpoch,
        values: &BitField,
    ) -> Result<(), ActorError> {
        if values.is_empty() {
            // nothing to do.
            return Ok(());
        }

        let epoch: u64 = self.quant.quantize_up(raw_epoch).try_into()?;

        let bitfield = self
            .amt
            .get(epoch)
            .with_context(|| format!("failed to lookup queue epoch {}", epoch))?
            .cloned()
            .unwrap_or_default();

        self.amt
            .set(epoch, &bitfield | values)
            .with_context(|| format!("failed to set queue epoch {}", epoch))?;

        Ok(())
    }

    pub fn add_to_queue_values(
        &mut self,
        epoch: ChainEpoch,
        values: impl IntoIterator<Item = u64>,
    ) -> Result<(), ActorError> {
        self.add_to_queue(epoch, &BitField::try_from_bits(values)?)
    }

    /// Removes and returns all values with keys less than or equal to until.
    /// Modified return value indicates whether this structure has been changed by the call.
    ///
    /// Keys are visited in ascending order, so iteration stops at the first key past `until`.
    /// The popped keys are removed in a single batch; on error the in-memory queue may be
    /// partially modified and must not be flushed.
    pub fn pop_until(&mut self, until: ChainEpoch) -> Result<(BitField, bool), ActorError> {
        let mut popped_values = BitField::new();
        let mut popped_keys = Vec::<u64>::new();

        self.amt
            .for_each_while(|epoch, bitfield| {
                if epoch as ChainEpoch > until {
                    // break
                    return Ok(false);
                }

                popped_keys.push(epoch);
                popped_values |= bitfield;
                Ok(true)
            })
            .context("failed to iterate bitfield queue")?;

        if popped_keys.is_empty() {
            // Nothing expired.
            return Ok((BitField::new(), false));
        }

        self.amt
            .batch_delete(popped_keys, true)
            .context("failed to delete popped epochs from bitfield queue")?;
        Ok((popped_values, true))
    }

    /// Writes the queue to the store and returns its new root.
    pub fn flush(&mut self) -> Result<Cid, ActorError> {
        self.amt.flush().context("failed to flush bitfield queue")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fil_actors_runtime::test_blockstores::MemoryBlockstore;
    use fvm_shared::clock::NO_QUANTIZATION;

    fn empty_queue_root(store: &MemoryBlockstore) -> Cid {
        Array::<BitField, _>::new_with_bit_width(store, 5).flush().unwrap()
    }

    fn bits(values: &[u64]) -> BitField {
        BitField::try_from_bits(values.iter().copied()).unwrap()
    }

    #[test]
    fn adding_empty_values_is_a_noop() {
        let store = MemoryBlockstore::new();
        let root = empty_queue_root(&store);
        let mut queue = BitFieldQueue::new(&store, &root, NO_QUANTIZATION).unwrap();

        queue.add_to_queue(10, &BitField::new()).unwrap();
        assert_eq!(0, queue.amt.count());
        assert_eq!(root, queue.flush().unwrap());
    }

    #[test]
    fn merges_values_at_same_epoch() {
        let store = MemoryBlockstore::new();
        let root = empty_queue_root(&store);
        let mut queue = BitFieldQueue::new(&store, &root, NO_QUANTIZATION).unwrap();

        queue.add_to_queue_values(7, [1, 3]).unwrap();
        queue.add_to_queue_values(7, [2, 3]).unwrap();
        assert_eq!(Some(&bits(&[1, 2, 3])), queue.amt.get(7).unwrap());
        assert_eq!(1, queue.amt.count());
    }

    #[test]
    fn quantizes_keys_upwards() {
        let store = MemoryBlockstore::new();
        let root = empty_queue_root(&store);
        let quant = QuantSpec { unit: 10, offset: 3 };
        let mut queue = BitFieldQueue::new(&store, &root, quant).unwrap();

        queue.add_to_queue_values(4, [0]).unwrap();
        queue.add_to_queue_values(13, [1]).unwrap();
        queue.add_to_queue_values(14, [2]).unwrap();

        assert_eq!(Some(&bits(&[0, 1])), queue.amt.get(13).unwrap());
        assert_eq!(Some(&bits(&[2])), queue.amt.get(23).unwrap());
    }

    #[test]
    fn negative_epochs_are_rejected() {
        let store = MemoryBlockstore::new();
        let root = empty_queue_root(&store);
        let mut queue = BitFieldQueue::new(&store, &root, NO_QUANTIZATION).unwrap();

        let err = queue.add_to_queue_values(-1, [0]).unwrap_err();
        assert_eq!(fvm_shared::error::ExitCode::USR_ILLEGAL_ARGUMENT, err.exit_code());
    }

    #[test]
    fn pop_until_stops_at_first_later_epoch() {
        let store = MemoryBlockstore::new();
        let root = empty_queue_root(&store);
        let mut queue = BitFieldQueue::new(&store, &root, NO_QUANTIZATION).unwrap();
        queue.add_to_queue_values(5, [0]).unwrap();
        queue.add_to_queue_values(9, [1, 4]).unwrap();
        queue.add_to_queue_values(40, [2]).unwrap();

        let (popped, modified) = queue.pop_until(9).unwrap();
        assert!(modified);
        assert_eq!(bits(&[0, 1, 4]), popped);
        assert_eq!(1, queue.amt.count());

        let (popped, modified) = queue.pop_until(9).unwrap();
        assert!(!modified);
        assert!(popped.is_empty());
    }
}
