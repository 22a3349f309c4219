//! Property-based generators.

use proptest::prelude::*;

/// One scripted operation against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOp {
    /// Create a key.
    Set {
        /// Target key.
        key: String,
        /// Value to write.
        value: String,
    },
    /// Replace an existing key's value.
    Update {
        /// Target key.
        key: String,
        /// Value to write.
        value: String,
    },
    /// Delete a key.
    Delete {
        /// Target key.
        key: String,
    },
}

impl ScriptOp {
    /// Returns the key this operation targets.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Update { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Keys drawn from a small pool so scripts collide on purpose.
pub fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (0u8..8).prop_map(|i| format!("key-{i}")),
        1 => "[a-z]{1,6}",
    ]
}

/// Short printable values.
pub fn arb_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{0,12}"
}

/// A single operation.
pub fn arb_op() -> impl Strategy<Value = ScriptOp> {
    prop_oneof![
        2 => (arb_key(), arb_value()).prop_map(|(key, value)| ScriptOp::Set { key, value }),
        2 => (arb_key(), arb_value()).prop_map(|(key, value)| ScriptOp::Update { key, value }),
        1 => arb_key().prop_map(|key| ScriptOp::Delete { key }),
    ]
}

/// A script of up to `max_len` operations.
pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<ScriptOp>> {
    proptest::collection::vec(arb_op(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn generators_produce_values() {
        let mut runner = TestRunner::default();
        let script = arb_script(16).new_tree(&mut runner).unwrap().current();
        assert!(script.len() <= 16);
    }
}
