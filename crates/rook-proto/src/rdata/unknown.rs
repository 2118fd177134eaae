//! Opaque RDATA for types without a structured decoder.

use crate::error::Result;
use crate::wire::{WireReader, WireWriter};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw RDATA carried through unchanged.
///
/// Rendered in the RFC 3597 generic form `\# <length> <hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unknown {
    type_code: u16,
    data: Vec<u8>,
}

impl Unknown {
    /// Creates opaque RDATA for the given type.
    pub fn new(type_code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            type_code,
            data: data.into(),
        }
    }

    /// Returns the record type code.
    #[inline]
    pub const fn type_code(&self) -> u16 {
        self.type_code
    }

    /// Returns the raw RDATA.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Captures the whole RDATA window.
    pub fn read(type_code: u16, window: &mut WireReader<'_>) -> Self {
        Self::new(type_code, window.read_rest())
    }

    /// Returns the encoded RDATA length.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.data.len()
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.data)
    }
}

impl fmt::Display for Unknown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())?;
        if !self.data.is_empty() {
            write!(f, " {}", HEXLOWER.encode(&self.data))?;
        }
        Ok(())
    }
}
