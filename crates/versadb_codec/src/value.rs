//! Dynamic record value type.

/// A value in a framed record.
///
/// The log format only needs three shapes: arrays to frame records and
/// batches, bulk strings for keys, values, and commands, and integers for
/// transaction stamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Array of values.
    Array(Vec<Value>),
    /// Opaque byte string.
    Bulk(Vec<u8>),
    /// Signed integer, serialized as decimal text.
    Integer(i64),
}

impl Value {
    /// Creates a bulk string value.
    pub fn bulk(data: impl Into<Vec<u8>>) -> Self {
        Value::Bulk(data.into())
    }

    /// Returns the elements if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the bytes if this is a bulk string.
    #[must_use]
    pub fn as_bulk(&self) -> Option<&[u8]> {
        match self {
            Value::Bulk(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the bulk bytes as UTF-8 text, if valid.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Bulk(data) => std::str::from_utf8(data).ok(),
            _ => None,
        }
    }

    /// Returns the integer value, accepting decimal bulk text as well.
    ///
    /// Stamps written by older log writers appear as bulk strings of
    /// decimal text; both spellings decode to the same number.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Bulk(data) => std::str::from_utf8(data).ok()?.parse().ok(),
            Value::Array(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_accessors() {
        let v = Value::bulk("hello");
        assert_eq!(v.as_bulk(), Some(&b"hello"[..]));
        assert_eq!(v.as_text(), Some("hello"));
        assert_eq!(v.as_array(), None);
    }

    #[test]
    fn integer_from_bulk_text() {
        assert_eq!(Value::bulk("42").as_integer(), Some(42));
        assert_eq!(Value::Integer(-7).as_integer(), Some(-7));
        assert_eq!(Value::bulk("not a number").as_integer(), None);
    }

    #[test]
    fn array_accessor() {
        let v = Value::Array(vec![Value::Integer(1)]);
        assert_eq!(v.as_array().map(<[Value]>::len), Some(1));
        assert_eq!(v.as_integer(), None);
    }
}
