//! Log record types and their framed representation.

use crate::types::TransactionId;
use versadb_codec::Value;

/// Command word for set records.
const CMD_SET: &str = "set";
/// Command word for delete records.
const CMD_DEL: &str = "del";

/// One record in the durability log.
///
/// On the wire a record is an array:
///
/// ```text
/// ["set", key, value, created_tx, deleted_tx]
/// ["del", key]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A version write.
    Set {
        /// The key written.
        key: String,
        /// The value written.
        value: String,
        /// Id of the transaction that wrote the version.
        created_tx: TransactionId,
        /// Id of the transaction that tombstoned it, or the sentinel.
        deleted_tx: TransactionId,
    },
    /// A tombstone of the current live version of a key.
    Del {
        /// The key deleted.
        key: String,
    },
}

impl LogRecord {
    /// Creates a set record for a live version.
    #[must_use]
    pub fn set(key: impl Into<String>, value: impl Into<String>, created_tx: TransactionId) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
            created_tx,
            deleted_tx: TransactionId::NONE,
        }
    }

    /// Creates a delete record.
    #[must_use]
    pub fn del(key: impl Into<String>) -> Self {
        Self::Del { key: key.into() }
    }

    /// Returns the key this record concerns.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Del { key } => key,
        }
    }

    /// Converts the record to its framed value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Set {
                key,
                value,
                created_tx,
                deleted_tx,
            } => Value::Array(vec![
                Value::bulk(CMD_SET),
                Value::bulk(key.as_bytes()),
                Value::bulk(value.as_bytes()),
                Value::Integer(created_tx.as_u64() as i64),
                Value::Integer(deleted_tx.as_u64() as i64),
            ]),
            Self::Del { key } => {
                Value::Array(vec![Value::bulk(CMD_DEL), Value::bulk(key.as_bytes())])
            }
        }
    }

    /// Parses a record from its framed value.
    ///
    /// Returns `None` for anything malformed: replay treats that as the
    /// end of the durable prefix.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let command = items.first()?.as_text()?;

        match command {
            CMD_SET => {
                if items.len() < 3 {
                    return None;
                }
                let key = items[1].as_text()?.to_string();
                let value = items[2].as_text()?.to_string();
                // Stamps are optional on the wire; absent means unknown.
                let created_tx = stamp(items.get(3))?;
                let deleted_tx = stamp(items.get(4))?;
                Some(Self::Set {
                    key,
                    value,
                    created_tx,
                    deleted_tx,
                })
            }
            CMD_DEL => {
                let key = items.get(1)?.as_text()?.to_string();
                Some(Self::Del { key })
            }
            _ => None,
        }
    }
}

/// Reads an optional transaction stamp: absent decodes as the sentinel,
/// present-but-malformed decodes as `None` (corrupt record).
fn stamp(value: Option<&Value>) -> Option<TransactionId> {
    match value {
        None => Some(TransactionId::NONE),
        Some(v) => {
            let n = v.as_integer()?;
            u64::try_from(n).ok().map(TransactionId::new)
        }
    }
}
