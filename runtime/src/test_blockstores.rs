// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use anyhow::{anyhow, Result};
use cid::Cid;

use fvm_ipld_blockstore::Blockstore;

/// Stats for a [MemoryBlockstore] this indicates the amount of read and written data
/// to the wrapped store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BSStats {
    /// Number of reads
    pub r: usize,
    /// Number of writes
    pub w: usize,
    /// Bytes Read
    pub br: usize,
    /// Bytes Written
    pub bw: usize,
}

/// In-memory `Blockstore` tracking reads and writes for verification.
/// This struct should only be used for testing.
#[derive(Debug, Default)]
pub struct MemoryBlockstore {
    blocks: RefCell<HashMap<Cid, Vec<u8>>>,
    pub stats: RefCell<BSStats>,
}

impl MemoryBlockstore {
    pub fn new() -> Self {
        Self { blocks: Default::default(), stats: Default::default() }
    }

    /// Number of distinct blocks held by the store.
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Drops a block, simulating a store that lost data it previously acknowledged.
    pub fn remove(&self, cid: &Cid) -> bool {
        self.blocks.borrow_mut().remove(cid).is_some()
    }
}

impl Blockstore for MemoryBlockstore {
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>> {
        let mut stats = self.stats.borrow_mut();
        stats.r += 1;

        let bytes = self.blocks.borrow().get(cid).cloned();

        if let Some(bytes) = &bytes {
            stats.br += bytes.len();
        }
        Ok(bytes)
    }

    fn has(&self, cid: &Cid) -> Result<bool> {
        self.stats.borrow_mut().r += 1;

        Ok(self.blocks.borrow().contains_key(cid))
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> Result<()> {
        let mut stats = self.stats.borrow_mut();
        stats.w += 1;
        stats.bw += block.len();

        self.blocks.borrow_mut().insert(*k, block.into());
        Ok(())
    }
}

/// Wraps a [MemoryBlockstore] and starts failing reads or writes once a budget of successful
/// operations is used up. A budget of `None` never fails.
#[derive(Debug, Default)]
pub struct FailingBlockstore {
    inner: MemoryBlockstore,
    gets_left: Cell<Option<usize>>,
    puts_left: Cell<Option<usize>>,
}

impl FailingBlockstore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Allows `n` more successful reads, then fails every subsequent one.
    pub fn fail_gets_after(&self, n: usize) {
        self.gets_left.set(Some(n));
    }

    /// Allows `n` more successful writes, then fails every subsequent one.
    pub fn fail_puts_after(&self, n: usize) {
        self.puts_left.set(Some(n));
    }

    /// Stops injecting failures.
    pub fn heal(&self) {
        self.gets_left.set(None);
        self.puts_left.set(None);
    }

    pub fn inner(&self) -> &MemoryBlockstore {
        &self.inner
    }

    fn consume(budget: &Cell<Option<usize>>) -> bool {
        match budget.get() {
            None => true,
            Some(0) => false,
            Some(n) => {
                budget.set(Some(n - 1));
                true
            }
        }
    }
}

impl Blockstore for FailingBlockstore {
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>> {
        if !Self::consume(&self.gets_left) {
            return Err(anyhow!("injected read failure for {}", cid));
        }
        self.inner.get(cid)
    }

    fn has(&self, cid: &Cid) -> Result<bool> {
        if !Self::consume(&self.gets_left) {
            return Err(anyhow!("injected read failure for {}", cid));
        }
        self.inner.has(cid)
    }

    fn put_keyed(&self, k: &Cid, block: &[u8]) -> Result<()> {
        if !Self::consume(&self.puts_left) {
            return Err(anyhow!("injected write failure for {}", k));
        }
        self.inner.put_keyed(k, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fvm_ipld_blockstore::Block;
    use multihash::Code;

    #[test]
    fn basic_tracking_store() {
        let tr_store = MemoryBlockstore::new();
        assert_eq!(*tr_store.stats.borrow(), BSStats::default());

        let block = Block::new(0x55, &b"foobar"[..]);
        tr_store.get(&block.cid(Code::Blake2b256)).unwrap();
        assert_eq!(*tr_store.stats.borrow(), BSStats { r: 1, ..Default::default() });

        let put_cid = tr_store.put(Code::Blake2b256, &block).unwrap();
        assert_eq!(tr_store.get(&put_cid).unwrap().as_deref(), Some(block.data));
        assert_eq!(
            *tr_store.stats.borrow(),
            BSStats { r: 2, br: block.len(), w: 1, bw: block.len() }
        );
        assert_eq!(1, tr_store.block_count());

        assert!(tr_store.remove(&put_cid));
        assert_eq!(None, tr_store.get(&put_cid).unwrap());
    }

    #[test]
    fn failing_store_honours_budgets() {
        let store = FailingBlockstore::new();
        let block = Block::new(0x55, &b"partition"[..]);

        store.fail_puts_after(1);
        let cid = store.put(Code::Blake2b256, &block).unwrap();
        let err = store.put(Code::Blake2b256, &Block::new(0x55, &b"other"[..])).unwrap_err();
        assert!(err.to_string().contains("injected write failure"));

        store.fail_gets_after(0);
        assert!(store.get(&cid).is_err());

        store.heal();
        assert_eq!(store.get(&cid).unwrap().as_deref(), Some(block.data));
        assert_eq!(1, store.inner().block_count());
    }
}
