// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use fvm_shared::clock::ChainEpoch;

/// Proving period parameters shared by the deadline schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// The period over which a miner's active sectors are expected to be proven via WindowPoSt.
    /// This guarantees that (1) user data is proven daily, (2) user data is stored for 24h by a rational miner
    /// (due to Window PoSt cost assumption).
    pub wpost_proving_period: ChainEpoch,
    /// The period between the opening and the closing of a WindowPoSt deadline in which the miner is expected to
    /// provide a Window PoSt proof.
    /// This provides a miner enough time to compute and propagate a Window PoSt proof.
    pub wpost_challenge_window: ChainEpoch,
    /// The number of non-overlapping PoSt deadlines in a proving period.
    /// This spreads a miner's Window PoSt work across a proving period.
    pub wpost_period_deadlines: u64,
    /// The lookback for the challenge of a deadline, relative to its opening epoch.
    pub wpost_challenge_lookback: ChainEpoch,
    /// Minimum period between fault declaration and the next deadline opening.
    /// If the number of epochs between fault declaration and deadline's challenge window opening is lower than FaultDeclarationCutoff,
    /// the fault declaration is ignored.
    pub fault_declaration_cutoff: ChainEpoch,
}

impl Policy {
    /// Checks that the proving period splits evenly into challenge windows.
    pub fn is_consistent(&self) -> bool {
        self.wpost_period_deadlines > 0
            && self.wpost_challenge_window > 0
            && self.wpost_proving_period
                == self.wpost_challenge_window * self.wpost_period_deadlines as ChainEpoch
    }
}

impl Default for Policy {
    fn default() -> Policy {
        Policy {
            wpost_proving_period: policy_constants::WPOST_PROVING_PERIOD,
            wpost_challenge_window: policy_constants::WPOST_CHALLENGE_WINDOW,
            wpost_period_deadlines: policy_constants::WPOST_PERIOD_DEADLINES,
            wpost_challenge_lookback: policy_constants::WPOST_CHALLENGE_LOOKBACK,
            fault_declaration_cutoff: policy_constants::FAULT_DECLARATION_CUTOFF,
        }
    }
}

pub mod policy_constants {
    use fvm_shared::clock::ChainEpoch;

    use crate::builtin::*;

    pub const WPOST_PROVING_PERIOD: ChainEpoch = EPOCHS_IN_DAY;

    // Half an hour (=48 per day)
    pub const WPOST_CHALLENGE_WINDOW: ChainEpoch = 30 * 60 / EPOCH_DURATION_SECONDS;

    pub const WPOST_PERIOD_DEADLINES: u64 = crate::builtin::WPOST_PERIOD_DEADLINES;

    pub const WPOST_CHALLENGE_LOOKBACK: ChainEpoch = 20;

    pub const FAULT_DECLARATION_CUTOFF: ChainEpoch = WPOST_CHALLENGE_LOOKBACK + 50;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_consistent() {
        let policy = Policy::default();
        assert!(policy.is_consistent());
        assert_eq!(48, policy.wpost_period_deadlines);
        assert_eq!(60, policy.wpost_challenge_window);
        assert_eq!(2880, policy.wpost_proving_period);
    }

    #[test]
    fn mismatched_window_is_inconsistent() {
        let policy = Policy { wpost_challenge_window: 59, ..Default::default() };
        assert!(!policy.is_consistent());
    }
}
