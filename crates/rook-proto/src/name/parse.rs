//! Domain name decoding with compression support (RFC 1035 Section 4.1.4).

use super::{Name, WireBuf};
use crate::error::{Error, Result};
use crate::MAX_NAME_LENGTH;

/// Top two bits of a length byte marking a compression pointer.
const POINTER_MASK: u8 = 0xC0;

/// Decodes domain names against a complete message buffer.
///
/// Compression pointers may reference any earlier offset of the message, so
/// the parser always holds the full buffer even when the caller is decoding a
/// narrow window such as an RDATA field.
#[derive(Debug, Clone, Copy)]
pub struct NameParser<'a> {
    message: &'a [u8],
}

impl<'a> NameParser<'a> {
    /// Creates a parser over the full message buffer.
    #[inline]
    pub const fn new(message: &'a [u8]) -> Self {
        Self { message }
    }

    /// Parses a name starting at `offset`.
    ///
    /// Returns the name and the number of bytes consumed at the call site:
    /// when a pointer is followed, that is the bytes up to and including the
    /// pointer, not the bytes of the target.
    #[inline]
    pub fn parse_name(&self, offset: usize) -> Result<(Name, usize)> {
        self.parse_name_within(offset, self.message.len())
    }

    /// Parses a name whose in-place bytes must end before `limit`.
    ///
    /// Bytes reached through a compression pointer are only bounded by the
    /// message. Every pointer must reference an offset strictly below both its
    /// own position and the previous pointer's target, so the chain of hops
    /// always terminates.
    pub fn parse_name_within(&self, offset: usize, limit: usize) -> Result<(Name, usize)> {
        let mut wire = WireBuf::new();
        let mut label_count = 0u8;
        let mut pos = offset;
        let mut end = limit.min(self.message.len());
        let mut consumed = None;
        let mut bound = usize::MAX;

        loop {
            if pos >= end {
                return Err(Error::truncated(pos, 1));
            }
            let len_byte = self.message[pos];

            match len_byte & POINTER_MASK {
                POINTER_MASK => {
                    if pos + 1 >= end {
                        return Err(Error::truncated(pos, 2));
                    }
                    let target =
                        usize::from(u16::from_be_bytes([len_byte & !POINTER_MASK, self.message[pos + 1]]));
                    if target >= pos || target >= bound {
                        return Err(Error::InvalidCompressionPointer {
                            offset: pos,
                            target,
                        });
                    }

                    consumed.get_or_insert_with(|| pos + 2 - offset);
                    bound = target;
                    end = self.message.len();
                    pos = target;
                }
                0x00 => {
                    let len = usize::from(len_byte);
                    if wire.len() + 1 + len > MAX_NAME_LENGTH {
                        return Err(Error::NameTooLong {
                            length: wire.len() + 1 + len,
                        });
                    }
                    if pos + 1 + len > end {
                        return Err(Error::truncated(pos, pos + 1 + len - end));
                    }

                    wire.push(len_byte);
                    wire.extend_from_slice(&self.message[pos + 1..pos + 1 + len]);
                    label_count += 1;
                    pos += 1 + len;

                    if len == 0 {
                        let consumed = consumed.unwrap_or_else(|| pos - offset);
                        return Ok((Name::from_parts(wire, label_count), consumed));
                    }
                }
                _ => {
                    return Err(Error::InvalidLabelType {
                        offset: pos,
                        value: len_byte,
                    })
                }
            }
        }
    }
}
