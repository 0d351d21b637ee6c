// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt::Display;

use fvm_shared::error::ExitCode;

use crate::{ActorError, AsActorError};

// Shorthands for the exit codes used by state transitions.
pub trait AsActorErrors<T>: Sized {
    /// Store or collection failure: the state could not be read or written.
    fn or_illegal_state<C>(self, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static;

    fn or_with_illegal_state<C, F>(self, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C;
}

impl<T, E: Display> AsActorErrors<T> for Result<T, E> {
    fn or_illegal_state<C>(self, context: C) -> Result<T, ActorError>
    where
        C: Display + 'static,
    {
        self.context_code(ExitCode::USR_ILLEGAL_STATE, context)
    }

    fn or_with_illegal_state<C, F>(self, f: F) -> Result<T, ActorError>
    where
        C: Display + 'static,
        F: FnOnce() -> C,
    {
        self.with_context_code(ExitCode::USR_ILLEGAL_STATE, f)
    }
}

/// Fails with an illegal state error carrying `msg` unless `predicate` holds.
pub fn require_state<S: AsRef<str>>(predicate: bool, msg: S) -> Result<(), ActorError> {
    if predicate {
        Ok(())
    } else {
        log::warn!("state invariant violated: {}", msg.as_ref());
        Err(ActorError::illegal_state(msg.as_ref().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_underlying_text() {
        let res: anyhow::Result<()> = Err(anyhow::anyhow!("blockstore unavailable"));
        let err =
            res.or_with_illegal_state(|| format!("failed to load deadline {}", 3)).unwrap_err();
        assert_eq!(ExitCode::USR_ILLEGAL_STATE, err.exit_code());
        assert_eq!("failed to load deadline 3: blockstore unavailable", err.msg());
    }

    #[test]
    fn require_state_reports_violation() {
        assert!(require_state(true, "fine").is_ok());
        let err = require_state(false, "baseline reward negative").unwrap_err();
        assert_eq!(ExitCode::USR_ILLEGAL_STATE, err.exit_code());
        assert_eq!("baseline reward negative", err.msg());
    }
}
