// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use multihash::Code;
use cid::Cid;
use fvm_ipld_blockstore::Block;

/// Installs the env logger once per test binary; later calls are no-ops.
pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Cid of an arbitrary raw block, for tests that only need a well-formed reference.
pub fn make_cid(data: &[u8]) -> Cid {
    Block::new(0x55, data).cid(Code::Blake2b256)
}
