use fvm_shared::clock::ChainEpoch;

pub mod tests;
pub mod util;

// proving period of every scenario miner
pub const TEST_PROVING_PERIOD_START: ChainEpoch = 0;
