//! Wire format cursors.
//!
//! [`WireReader`] walks an immutable message buffer with an optional upper
//! bound, so RDATA decoders can be confined to their RDLENGTH window while
//! still resolving compression pointers against the whole message.

use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use bytes::{BufMut, Bytes, BytesMut};

/// A bounds-checked cursor over a DNS message.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    /// The complete message.
    data: &'a [u8],
    /// Current position.
    pos: usize,
    /// Reads must end at or before this offset.
    limit: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            limit: data.len(),
        }
    }

    /// Creates a reader positioned at `offset`.
    #[inline]
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            pos: offset,
            limit: data.len(),
        }
    }

    /// Returns the complete message buffer.
    #[inline]
    pub const fn message(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the current position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the bytes left before the limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    /// Returns true if the cursor has reached its limit.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Splits off a reader for the next `len` bytes and advances past them.
    ///
    /// The returned reader shares the message buffer, so names inside the
    /// window can still follow pointers to earlier offsets.
    pub fn window(&mut self, len: usize) -> Result<WireReader<'a>> {
        self.ensure(len)?;
        let sub = WireReader {
            data: self.data,
            pos: self.pos,
            limit: self.pos + len,
        };
        self.pos += len;
        Ok(sub)
    }

    #[inline]
    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::truncated(self.pos, n - self.remaining()));
        }
        Ok(())
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Reads a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let value = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    /// Reads a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let b = &self.data[self.pos..self.pos + 4];
        let value = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        self.pos += 4;
        Ok(value)
    }

    /// Reads a slice of bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads everything up to the limit.
    #[inline]
    pub fn read_rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..self.limit];
        self.pos = self.limit;
        slice
    }

    /// Decodes a possibly compressed domain name at the cursor.
    ///
    /// The cursor advances past the in-place bytes only: when a pointer is
    /// followed it ends up just after the pointer.
    pub fn read_name(&mut self) -> Result<Name> {
        let (name, consumed) =
            NameParser::new(self.data).parse_name_within(self.pos, self.limit)?;
        self.pos += consumed;
        Ok(name)
    }
}

/// A size-limited writer for DNS wire format.
#[derive(Debug)]
pub struct WireWriter {
    buf: BytesMut,
    max_size: Option<usize>,
}

impl WireWriter {
    /// Creates an unbounded writer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            max_size: None,
        }
    }

    /// Creates a writer that refuses to grow past `max_size` bytes.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_size.min(4096)),
            max_size: Some(max_size),
        }
    }

    /// Returns the current length.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing was written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the capacity left before the size limit.
    pub fn remaining(&self) -> usize {
        self.max_size
            .map_or(usize::MAX, |max| max.saturating_sub(self.buf.len()))
    }

    #[inline]
    fn reserve(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::BufferOverflow {
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    /// Writes a big-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?;
        self.buf.put_u16(value);
        Ok(())
    }

    /// Writes a big-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?;
        self.buf.put_u32(value);
        Ok(())
    }

    /// Writes a slice of bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Writes a name without compression.
    #[inline]
    pub fn write_name(&mut self, name: &Name) -> Result<()> {
        self.write_bytes(name.as_wire())
    }

    /// Overwrites bytes already written, used to patch length fields.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        if offset + bytes.len() <= self.buf.len() {
            self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
    }

    /// Returns the written data as frozen bytes.
    #[inline]
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
