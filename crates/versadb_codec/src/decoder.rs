//! Incremental record decoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Largest accepted element count for an array.
/// Caps allocation from a damaged length header.
const MAX_ARRAY_LEN: i64 = 16 * 1024 * 1024;

/// Largest accepted bulk string, 256 MB.
const MAX_BULK_LEN: i64 = 256 * 1024 * 1024;

/// A cursor-based decoder over a byte slice.
///
/// Call [`Decoder::decode`] repeatedly to walk concatenated records. When
/// the slice ends cleanly between records, [`Decoder::is_empty`] reports
/// true; when a record is cut short mid-frame, `decode` fails with
/// [`CodecError::UnexpectedEof`] and the bytes before the failed record
/// remain fully decoded.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decodes the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        let prefix = self.read_byte()?;
        match prefix {
            b'*' => {
                let count = self.read_length(MAX_ARRAY_LEN)?;
                let mut items = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    items.push(self.decode()?);
                }
                Ok(Value::Array(items))
            }
            b'$' => {
                let len = self.read_length(MAX_BULK_LEN)? as usize;
                let data = self.read_exact(len)?.to_vec();
                self.read_crlf()?;
                Ok(Value::Bulk(data))
            }
            b':' => {
                let line = self.read_line()?;
                parse_i64(line).map(Value::Integer)
            }
            byte => Err(CodecError::InvalidPrefix { byte }),
        }
    }

    /// Returns true when the cursor has consumed all input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the cursor position in bytes.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_byte(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn read_exact(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads up to the next CRLF, returning the line without it.
    fn read_line(&mut self) -> CodecResult<&'a [u8]> {
        let rest = &self.data[self.pos..];
        match rest.windows(2).position(|w| w == b"\r\n") {
            Some(at) => {
                self.pos += at + 2;
                Ok(&rest[..at])
            }
            None => Err(CodecError::UnexpectedEof),
        }
    }

    fn read_crlf(&mut self) -> CodecResult<()> {
        let bytes = self.read_exact(2)?;
        if bytes != b"\r\n" {
            return Err(CodecError::MissingTerminator);
        }
        Ok(())
    }

    fn read_length(&mut self, max: i64) -> CodecResult<i64> {
        let line = self.read_line()?;
        let len = parse_i64(line)?;
        if len < 0 || len > max {
            return Err(CodecError::InvalidLength { len });
        }
        Ok(len)
    }
}

fn parse_i64(line: &[u8]) -> CodecResult<i64> {
    let text = std::str::from_utf8(line).map_err(|_| CodecError::InvalidInteger)?;
    if text.is_empty() {
        return Err(CodecError::InvalidInteger);
    }
    text.parse().map_err(|_| CodecError::InvalidInteger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::to_bytes;

    #[test]
    fn roundtrip_bulk() {
        let v = Value::bulk("hello");
        let bytes = to_bytes(&v);
        assert_eq!(Decoder::new(&bytes).decode().unwrap(), v);
    }

    #[test]
    fn roundtrip_integer() {
        for n in [0, 1, -1, i64::MAX, i64::MIN] {
            let bytes = to_bytes(&Value::Integer(n));
            assert_eq!(Decoder::new(&bytes).decode().unwrap(), Value::Integer(n));
        }
    }

    #[test]
    fn roundtrip_nested_record() {
        let v = Value::Array(vec![
            Value::Array(vec![Value::bulk("set"), Value::bulk("k"), Value::bulk("v")]),
            Value::Array(vec![Value::bulk("del"), Value::bulk("k")]),
        ]);
        let bytes = to_bytes(&v);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.decode().unwrap(), v);
        assert!(decoder.is_empty());
    }

    #[test]
    fn concatenated_records_decode_in_order() {
        let mut bytes = to_bytes(&Value::Integer(1));
        bytes.extend(to_bytes(&Value::Integer(2)));

        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.decode().unwrap(), Value::Integer(1));
        assert_eq!(decoder.decode().unwrap(), Value::Integer(2));
        assert!(decoder.is_empty());
    }

    #[test]
    fn truncated_tail_reports_eof() {
        let bytes = to_bytes(&Value::Array(vec![Value::bulk("set"), Value::bulk("key")]));

        // Any proper prefix of the record fails with UnexpectedEof, never
        // with a corruption error.
        for cut in 0..bytes.len() {
            let err = Decoder::new(&bytes[..cut]).decode().unwrap_err();
            assert!(err.is_truncation(), "cut at {cut} gave {err:?}");
        }
    }

    #[test]
    fn bad_prefix_is_corruption() {
        let err = Decoder::new(b"%3\r\n").decode().unwrap_err();
        assert_eq!(err, CodecError::InvalidPrefix { byte: b'%' });
        assert!(!err.is_truncation());
    }

    #[test]
    fn negative_length_rejected() {
        let err = Decoder::new(b"$-1\r\n").decode().unwrap_err();
        assert_eq!(err, CodecError::InvalidLength { len: -1 });
    }

    #[test]
    fn garbage_integer_rejected() {
        let err = Decoder::new(b":12x4\r\n").decode().unwrap_err();
        assert_eq!(err, CodecError::InvalidInteger);
    }

    #[test]
    fn bulk_body_must_end_with_crlf() {
        let err = Decoder::new(b"$3\r\nabcXY").decode().unwrap_err();
        assert_eq!(err, CodecError::MissingTerminator);
    }

    #[test]
    fn binary_bulk_roundtrip() {
        let v = Value::bulk(vec![0u8, 13, 10, 42, 255]);
        let bytes = to_bytes(&v);
        assert_eq!(Decoder::new(&bytes).decode().unwrap(), v);
    }
}
