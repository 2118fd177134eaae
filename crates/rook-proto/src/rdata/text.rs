//! TXT records.

use crate::error::{Error, Result};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// TXT record - one or more character-strings (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TXT {
    strings: SmallVec<[Vec<u8>; 2]>,
}

impl TXT {
    /// Creates a TXT record from a single text value, split into
    /// 255-byte character-strings as needed.
    pub fn new(text: impl AsRef<[u8]>) -> Self {
        let text = text.as_ref();
        let mut strings: SmallVec<[Vec<u8>; 2]> =
            text.chunks(255).map(<[u8]>::to_vec).collect();
        if strings.is_empty() {
            strings.push(Vec::new());
        }
        Self { strings }
    }

    /// Returns the character-strings.
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Returns all strings concatenated as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        let joined: Vec<u8> = self.strings.concat();
        String::from_utf8_lossy(&joined).into_owned()
    }

    /// Decodes the RDATA window.
    pub fn read(window: &mut WireReader<'_>) -> Result<Self> {
        let mut strings = SmallVec::new();
        while !window.is_empty() {
            let len = usize::from(window.read_u8()?);
            let bytes = window.read_bytes(len)?;
            strings.push(bytes.to_vec());
        }
        Ok(Self { strings })
    }

    /// Returns the encoded RDATA length.
    pub fn wire_len(&self) -> usize {
        self.strings.iter().map(|s| 1 + s.len()).sum()
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        for s in &self.strings {
            let len = u8::try_from(s.len())
                .map_err(|_| Error::invalid_rdata("TXT", "character-string over 255 bytes"))?;
            writer.write_u8(len)?;
            writer.write_bytes(s)?;
        }
        Ok(())
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.strings.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str("\"")?;
            for &b in s {
                match b {
                    b'"' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x20..=0x7E => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{b:03}")?,
                }
            }
            f.write_str("\"")?;
        }
        Ok(())
    }
}
