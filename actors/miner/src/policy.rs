// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Bitwidth of AMTs determined empirically from mutation patterns and projections of mainnet data.
/// Usually a small array
pub const DEADLINE_PARTITIONS_AMT_BITWIDTH: u32 = 3;
pub const DEADLINE_EXPIRATIONS_AMT_BITWIDTH: u32 = 5;
pub const DEADLINE_FAULTS_AMT_BITWIDTH: u32 = 5;
