//! Label access for domain names.

use std::borrow::Cow;
use std::fmt;

/// A single label of a domain name, borrowed from the name's wire bytes.
///
/// The root label is the empty label that terminates every name.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Label<'a> {
    bytes: &'a [u8],
}

impl<'a> Label<'a> {
    /// Returns the raw bytes of the label (without length prefix).
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the length of the label in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if this is the root label.
    #[inline]
    pub const fn is_root(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if the label is empty (same as root).
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the label as text, with invalid UTF-8 replaced.
    #[inline]
    pub fn as_str_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }

    /// ASCII case-insensitive comparison.
    #[inline]
    pub fn eq_ignore_ascii_case(&self, other: &Label<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }
}

impl fmt::Display for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.bytes {
            match b {
                b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                0x21..=0x7E => write!(f, "{}", b as char)?,
                _ => write!(f, "\\{b:03}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label(\"{self}\")")
    }
}

/// Iterator over the labels of an uncompressed wire-format name.
///
/// Yields the root label last.
#[derive(Debug, Clone)]
pub struct LabelIter<'a> {
    wire: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> LabelIter<'a> {
    pub(super) const fn new(wire: &'a [u8]) -> Self {
        Self {
            wire,
            pos: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = Label<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let len = usize::from(*self.wire.get(self.pos)?);
        if len == 0 {
            self.done = true;
            return Some(Label { bytes: &[] });
        }

        let bytes = self.wire.get(self.pos + 1..self.pos + 1 + len)?;
        self.pos += 1 + len;
        Some(Label { bytes })
    }
}
