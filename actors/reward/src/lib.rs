// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use self::logic::*;
pub use self::state::State;

pub(crate) mod expneg;
mod logic;
mod state;
pub mod testing;
