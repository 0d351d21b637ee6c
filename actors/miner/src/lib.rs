// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Proving deadline schedule of a storage miner.
//!
//! A miner's partitions are spread over `wpost_period_deadlines` challenge windows per proving
//! period. [`Deadlines`] holds one content address per window; each [`Deadline`] tracks its
//! partitions and epoch keyed queues of partitions with expiring or faulty sectors.

pub use bitfield_queue::*;
pub use deadline_info::*;
pub use deadline_state::*;
pub use policy::*;

mod bitfield_queue;
mod deadline_info;
mod deadline_state;
mod policy;
pub mod testing;
