// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use self::errors::*;
pub use self::message_accumulator::MessageAccumulator;

mod errors;
mod message_accumulator;
