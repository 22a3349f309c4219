//! Reference model of the store contract.

use crate::generators::ScriptOp;
use std::collections::BTreeMap;
use versadb_core::{CoreResult, Transaction};

/// A plain-map model of the committed key space.
///
/// Applies the same contract the engine does - `set` refuses existing
/// keys, `update` and `delete` refuse absent ones - so an engine run and
/// a model run of the same script must agree on the surviving state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    entries: BTreeMap<String, String>,
}

impl Model {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one operation; returns true if the contract admitted it.
    pub fn apply(&mut self, op: &ScriptOp) -> bool {
        match op {
            ScriptOp::Set { key, value } => {
                if self.entries.contains_key(key) {
                    return false;
                }
                self.entries.insert(key.clone(), value.clone());
                true
            }
            ScriptOp::Update { key, value } => {
                if !self.entries.contains_key(key) {
                    return false;
                }
                self.entries.insert(key.clone(), value.clone());
                true
            }
            ScriptOp::Delete { key } => self.entries.remove(key).is_some(),
        }
    }

    /// Returns the modeled value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the live entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keys are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applies one scripted operation through a transaction.
///
/// Contract errors mirror the model's refusals and report `Ok(false)`.
///
/// # Errors
///
/// Propagates any non-contract error.
pub fn apply_op(tx: &mut Transaction, op: &ScriptOp) -> CoreResult<bool> {
    use versadb_core::CoreError;

    let result = match op {
        ScriptOp::Set { key, value } => tx.set(key, value),
        ScriptOp::Update { key, value } => tx.update(key, value),
        ScriptOp::Delete { key } => tx.delete(key),
    };

    match result {
        Ok(()) => Ok(true),
        Err(CoreError::AlreadyExists | CoreError::NotFound) => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_enforces_contract() {
        let mut model = Model::new();

        assert!(model.apply(&ScriptOp::Set {
            key: "k".into(),
            value: "1".into()
        }));
        assert!(!model.apply(&ScriptOp::Set {
            key: "k".into(),
            value: "2".into()
        }));
        assert_eq!(model.get("k"), Some("1"));

        assert!(model.apply(&ScriptOp::Update {
            key: "k".into(),
            value: "3".into()
        }));
        assert_eq!(model.get("k"), Some("3"));

        assert!(model.apply(&ScriptOp::Delete { key: "k".into() }));
        assert!(model.is_empty());
        assert!(!model.apply(&ScriptOp::Delete { key: "k".into() }));
    }

    #[test]
    fn engine_and_model_agree_on_a_small_script() {
        let db = versadb_core::Database::open_in_memory().unwrap();
        let mut model = Model::new();
        let script = [
            ScriptOp::Set {
                key: "a".into(),
                value: "1".into(),
            },
            ScriptOp::Set {
                key: "a".into(),
                value: "dup".into(),
            },
            ScriptOp::Update {
                key: "a".into(),
                value: "2".into(),
            },
            ScriptOp::Delete { key: "ghost".into() },
        ];

        let mut tx = db.begin(true).unwrap();
        for op in &script {
            let applied = apply_op(&mut tx, op).unwrap();
            assert_eq!(applied, model.apply(op));
        }
        tx.commit().unwrap();

        let mut tx = db.begin(false).unwrap();
        assert_eq!(tx.get("a").unwrap(), "2");
        assert_eq!(model.get("a"), Some("2"));
    }
}
