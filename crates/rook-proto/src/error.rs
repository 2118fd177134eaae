//! Wire codec error types.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// DNS wire codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Header Errors
    // =========================================================================
    /// Fewer than 12 bytes were available for the header.
    #[error("malformed header: need 12 bytes, got {actual}")]
    MalformedHeader {
        /// Bytes actually available.
        actual: usize,
    },

    /// The reserved Z bits of the header were not zero.
    #[error("reserved header bits set: {bits:#05b}")]
    ReservedBitsSet {
        /// Value of the 3-bit reserved field.
        bits: u8,
    },

    /// Opcode not defined by RFC 1035/1996/2136.
    #[error("invalid opcode: {value}")]
    InvalidOpCode {
        /// The invalid opcode value.
        value: u8,
    },

    // =========================================================================
    // Record Errors
    // =========================================================================
    /// A section entry or its RDATA ran past the RDLENGTH window or the end
    /// of the message.
    #[error("truncated record at offset {offset}: needed {needed} more bytes")]
    TruncatedRecord {
        /// Offset where the read started.
        offset: usize,
        /// Bytes that were missing.
        needed: usize,
    },

    /// RDATA content is inconsistent with its type.
    #[error("invalid {rtype} RDATA: {message}")]
    InvalidRData {
        /// Record type mnemonic.
        rtype: &'static str,
        /// What went wrong.
        message: String,
    },

    // =========================================================================
    // Domain Name Errors
    // =========================================================================
    /// Compression pointer does not point strictly backwards.
    #[error("invalid compression pointer at offset {offset}: points to {target}")]
    InvalidCompressionPointer {
        /// Offset of the pointer.
        offset: usize,
        /// Target offset the pointer references.
        target: usize,
    },

    /// Label length byte uses the reserved 0b01 or 0b10 prefix.
    #[error("invalid label type {value:#04x} at offset {offset}")]
    InvalidLabelType {
        /// Offset of the length byte.
        offset: usize,
        /// The length byte.
        value: u8,
    },

    /// Label exceeds maximum length of 63 bytes.
    #[error("label too long: {length} bytes exceeds maximum of 63")]
    LabelTooLong {
        /// Actual label length.
        length: usize,
    },

    /// Domain name exceeds maximum length of 255 bytes.
    #[error("name too long: {length} bytes exceeds maximum of 255")]
    NameTooLong {
        /// Actual name length in wire format.
        length: usize,
    },

    /// Presentation-format name could not be parsed.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The input text.
        name: String,
        /// What went wrong.
        reason: &'static str,
    },

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    /// Encoded output exceeded the writer's size limit.
    #[error("buffer overflow: cannot write {needed} bytes with {available} available")]
    BufferOverflow {
        /// Bytes needed to write.
        needed: usize,
        /// Available space in buffer.
        available: usize,
    },

    /// A section holds more entries than a 16-bit count can express.
    #[error("too many entries in {section} section: {count}")]
    SectionTooLarge {
        /// Section name.
        section: &'static str,
        /// Number of entries.
        count: usize,
    },
}

impl Error {
    /// Creates a truncated record error.
    #[inline]
    pub fn truncated(offset: usize, needed: usize) -> Self {
        Self::TruncatedRecord { offset, needed }
    }

    /// Creates an invalid RDATA error.
    #[inline]
    pub fn invalid_rdata(rtype: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRData {
            rtype,
            message: message.into(),
        }
    }

    /// Creates an invalid name error.
    #[inline]
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Returns true if this error came from decoding untrusted wire data.
    ///
    /// Malformed input is never retried; the datagram that produced it is
    /// dropped.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedHeader { .. }
                | Self::ReservedBitsSet { .. }
                | Self::InvalidOpCode { .. }
                | Self::TruncatedRecord { .. }
                | Self::InvalidRData { .. }
                | Self::InvalidCompressionPointer { .. }
                | Self::InvalidLabelType { .. }
                | Self::LabelTooLong { .. }
                | Self::NameTooLong { .. }
        )
    }
}
