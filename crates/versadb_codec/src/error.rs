//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding framed records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before the record did.
    ///
    /// This is the one recoverable condition: a log whose final record was
    /// torn by a crash decodes everything before it and then reports this.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The byte at the start of a value is not a known type prefix.
    #[error("invalid type prefix: 0x{byte:02x}")]
    InvalidPrefix {
        /// The offending byte.
        byte: u8,
    },

    /// An integer literal contained non-digit bytes or overflowed.
    #[error("invalid integer literal")]
    InvalidInteger,

    /// A declared length was negative or implausibly large.
    #[error("invalid length: {len}")]
    InvalidLength {
        /// The declared length.
        len: i64,
    },

    /// A CRLF terminator was expected but other bytes were found.
    #[error("missing CRLF terminator")]
    MissingTerminator,
}

impl CodecError {
    /// Returns true if this error means the input was cut short rather
    /// than structurally corrupt.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof)
    }
}
