// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_ipld_amt::Amt;

pub use self::actor_error::*;
pub use self::builtin::*;
pub use self::util::*;

pub mod actor_error;
pub mod builtin;
pub mod runtime;
pub mod util;

pub mod test_blockstores;
#[cfg(feature = "test_utils")]
pub mod test_utils;

/// Array type used for epoch and partition indexed queues. The store is borrowed so that
/// structures holding only root Cids can load the collection on demand.
pub type Array<'bs, V, BS> = Amt<V, &'bs BS>;
