// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use itertools::Itertools;
#[cfg(feature = "test_utils")]
use regex::Regex;

/// Accumulates invariant violations found while checking a state value.
#[derive(Debug, Default)]
pub struct MessageAccumulator {
    /// Shared with every accumulator derived through `with_prefix()`.
    msgs: Rc<RefCell<Vec<String>>>,
    /// Prepended to every new message, e.g. "deadline 3: ".
    prefix: String,
}

impl MessageAccumulator {
    /// Returns a new accumulator backed by the same collection, that will prefix each new message with
    /// a formatted string.
    pub fn with_prefix<S: AsRef<str>>(&self, prefix: S) -> Self {
        MessageAccumulator {
            msgs: self.msgs.clone(),
            prefix: self.prefix.to_owned() + prefix.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.msgs.borrow().is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.msgs.borrow().to_owned()
    }

    /// Returns the number of accumulated messages
    pub fn len(&self) -> usize {
        self.msgs.borrow().len()
    }

    pub fn add<S: AsRef<str>>(&self, msg: S) {
        self.msgs.borrow_mut().push(format!("{}{}", self.prefix, msg.as_ref()));
    }

    /// Adds a message if predicate is false
    pub fn require<S: AsRef<str>>(&self, predicate: bool, msg: S) {
        if !predicate {
            self.add(msg);
        }
    }

    /// Adds a message if result is `Err`. Underlying error must be `Display`.
    pub fn require_no_error<V, E: Display, S: AsRef<str>>(&self, result: Result<V, E>, msg: S) {
        if let Err(e) = result {
            self.add(format!("{}: {e}", msg.as_ref()));
        }
    }

    /// Panic if the accumulator isn't empty. The accumulated messages are included in the panic message.
    #[track_caller]
    pub fn assert_empty(&self) {
        assert!(self.is_empty(), "{}", self.msgs.borrow().iter().join("\n"))
    }

    /// Asserts the accumulator contains messages matching provided pattern *in the given order*.
    #[cfg(feature = "test_utils")]
    #[track_caller]
    pub fn assert_expected(&self, expected_patterns: &[Regex]) {
        let messages = self.messages();
        assert!(
            messages.len() == expected_patterns.len(),
            "Incorrect number of accumulator messages. Actual: {}.\nExpected: {}",
            messages.join("\n"),
            expected_patterns.iter().map(|regex| regex.as_str()).join("\n")
        );

        messages.iter().zip(expected_patterns).for_each(|(message, pattern)| {
            assert!(
                pattern.is_match(message),
                "message does not match. Actual: {}, expected: {}",
                message,
                pattern.as_str()
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_accumulators_share_messages() {
        let acc = MessageAccumulator::default();
        acc.add("epoch -1");

        let deadline_acc = acc.with_prefix("deadline 7: ");
        deadline_acc.require(false, "empty expiration entry at epoch 100");
        deadline_acc.require(true, "never added");

        assert_eq!(2, acc.len());
        assert_eq!(
            acc.messages(),
            vec!["epoch -1", "deadline 7: empty expiration entry at epoch 100"]
        );
        assert_eq!(acc.messages(), deadline_acc.messages());
    }

    #[test]
    fn require_no_error_formats_cause() {
        let acc = MessageAccumulator::default();
        acc.require_no_error(Err::<(), _>("missing block"), "failed to load deadline 2");
        acc.require_no_error(Ok::<(), String>(()), "not recorded");
        assert_eq!(acc.messages(), vec!["failed to load deadline 2: missing block"]);
    }

    #[test]
    fn assert_expected_matches_patterns() {
        let acc = MessageAccumulator::default();
        acc.add("deadline 1: queue key -5 is not a valid epoch");
        acc.assert_expected(&[Regex::new("^deadline 1: queue key -5").unwrap()]);
    }

    #[test]
    #[should_panic(expected = "effective network time")]
    fn assert_empty_panics_with_messages() {
        let acc = MessageAccumulator::default();
        acc.add("effective network time 12 greater than state epoch 3");
        acc.assert_empty();
    }
}
