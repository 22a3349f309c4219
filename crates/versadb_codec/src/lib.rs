//! # VersaDB Codec
//!
//! Framed record codec for the VersaDB append-only log.
//!
//! Records are arrays of bulk strings and integers, framed with
//! length-prefixed headers so that a reader can always tell a truncated
//! tail from a complete record:
//!
//! ```text
//! *<count>\r\n            array of <count> elements
//! $<len>\r\n<bytes>\r\n   bulk string of <len> bytes
//! :<value>\r\n            integer, decimal text
//! ```
//!
//! Concatenated records carry no global header. Decoding a truncated
//! record fails with [`CodecError::UnexpectedEof`], which callers treat as
//! clean end-of-log; every other error indicates structural corruption.
//!
//! ## Example
//!
//! ```rust
//! use versadb_codec::{Decoder, Encoder, Value};
//!
//! let record = Value::Array(vec![Value::bulk("set"), Value::bulk("key"), Value::Integer(7)]);
//! let bytes = versadb_codec::to_bytes(&record);
//!
//! let mut decoder = Decoder::new(&bytes);
//! assert_eq!(decoder.decode().unwrap(), record);
//! assert!(decoder.is_empty());
//! # let _ = Encoder::new();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::Decoder;
pub use encoder::{to_bytes, Encoder};
pub use error::{CodecError, CodecResult};
pub use value::Value;
