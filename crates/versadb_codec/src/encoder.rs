//! Record encoder.

use crate::value::Value;

/// Encodes a single value to its wire bytes.
#[must_use]
pub fn to_bytes(value: &Value) -> Vec<u8> {
    let mut encoder = Encoder::new();
    encoder.encode(value);
    encoder.into_bytes()
}

/// An appending record encoder.
///
/// Multiple values encoded into one encoder concatenate on the wire with
/// no separator, which is exactly how the log lays out its batches.
#[derive(Debug, Default)]
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    /// Creates a new encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Appends the wire encoding of `value`.
    pub fn encode(&mut self, value: &Value) {
        match value {
            Value::Array(items) => {
                self.write_header(b'*', items.len() as i64);
                for item in items {
                    self.encode(item);
                }
            }
            Value::Bulk(data) => {
                self.write_header(b'$', data.len() as i64);
                self.buffer.extend_from_slice(data);
                self.buffer.extend_from_slice(b"\r\n");
            }
            Value::Integer(n) => {
                self.write_header(b':', *n);
            }
        }
    }

    /// Consumes the encoder and returns the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Returns the bytes encoded so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn write_header(&mut self, prefix: u8, n: i64) {
        self.buffer.push(prefix);
        self.buffer.extend_from_slice(n.to_string().as_bytes());
        self.buffer.extend_from_slice(b"\r\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_wire_format() {
        assert_eq!(to_bytes(&Value::bulk("set")), b"$3\r\nset\r\n");
        assert_eq!(to_bytes(&Value::bulk("")), b"$0\r\n\r\n");
    }

    #[test]
    fn integer_wire_format() {
        assert_eq!(to_bytes(&Value::Integer(42)), b":42\r\n");
        assert_eq!(to_bytes(&Value::Integer(-1)), b":-1\r\n");
    }

    #[test]
    fn array_wire_format() {
        let v = Value::Array(vec![Value::bulk("del"), Value::bulk("k")]);
        assert_eq!(to_bytes(&v), b"*2\r\n$3\r\ndel\r\n$1\r\nk\r\n");
    }

    #[test]
    fn nested_arrays() {
        let v = Value::Array(vec![Value::Array(vec![Value::Integer(1)])]);
        assert_eq!(to_bytes(&v), b"*1\r\n*1\r\n:1\r\n");
    }

    #[test]
    fn encoder_concatenates() {
        let mut encoder = Encoder::new();
        encoder.encode(&Value::Integer(1));
        encoder.encode(&Value::Integer(2));
        assert_eq!(encoder.as_bytes(), b":1\r\n:2\r\n");
    }

    #[test]
    fn bulk_binary_payload() {
        let v = Value::bulk(vec![0u8, 13, 10, 255]);
        assert_eq!(to_bytes(&v), b"$4\r\n\x00\r\n\xff\r\n");
    }
}
