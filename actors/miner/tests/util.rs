#![allow(dead_code)]

use fil_actor_miner::{Deadline, Deadlines};
use fil_actors_runtime::runtime::Policy;
use fil_actors_runtime::test_blockstores::MemoryBlockstore;
use fil_actors_runtime::test_utils::init_logging;
use fvm_ipld_bitfield::BitField;
use fvm_ipld_blockstore::Blockstore;

pub fn setup() -> (Policy, MemoryBlockstore) {
    init_logging();
    (Policy::default(), MemoryBlockstore::new())
}

pub fn new_bitfield(bits: &[u64]) -> BitField {
    BitField::try_from_bits(bits.iter().copied()).unwrap()
}

pub fn assert_bitfield_equals(bf: &BitField, bits: &[u64]) {
    let actual: Vec<u64> = bf.iter().collect();
    assert_eq!(bits, actual.as_slice());
}

pub fn empty_deadline<BS: Blockstore>(store: &BS) -> Deadline {
    Deadline::new(store).unwrap()
}

pub fn empty_deadlines<BS: Blockstore>(policy: &Policy, store: &BS) -> Deadlines {
    Deadlines::new_empty(policy, store).unwrap()
}
