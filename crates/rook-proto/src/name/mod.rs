//! Domain names.
//!
//! A [`Name`] always holds the uncompressed wire form of a fully-qualified
//! name, ending in the zero-length root label. Compression is resolved at
//! decode time by [`NameParser`]; encoding never emits pointers.

mod label;
mod parse;

pub use label::{Label, LabelIter};
pub use parse::NameParser;

use crate::error::{Error, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Inline capacity covering most real-world names.
type WireBuf = SmallVec<[u8; 64]>;

/// A DNS domain name.
///
/// # Wire Format
///
/// `www.example.com.` is stored as:
///
/// ```text
/// 03 'w' 'w' 'w' 07 'e' 'x' 'a' 'm' 'p' 'l' 'e' 03 'c' 'o' 'm' 00
/// ```
///
/// # Comparison Semantics
///
/// Names compare and hash case-insensitively.
///
/// # Example
///
/// ```rust
/// use rook_proto::name::Name;
/// use std::str::FromStr;
///
/// let name = Name::from_str("www.example.com.").unwrap();
/// assert_eq!(name.label_count(), 4); // www, example, com, root
/// assert_eq!(Name::from_str("WWW.EXAMPLE.COM").unwrap(), name);
/// ```
#[derive(Clone)]
pub struct Name {
    wire: WireBuf,
    label_count: u8,
}

impl Name {
    /// Returns the root name `.`.
    #[inline]
    pub fn root() -> Self {
        let mut wire = WireBuf::new();
        wire.push(0);
        Self {
            wire,
            label_count: 1,
        }
    }

    /// Builds a name from uncompressed wire bytes, validating label layout.
    pub fn from_wire(slice: &[u8]) -> Result<Self> {
        if slice.len() > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong {
                length: slice.len(),
            });
        }

        let mut pos = 0;
        let mut label_count = 0u8;
        loop {
            let len = usize::from(
                *slice
                    .get(pos)
                    .ok_or_else(|| Error::truncated(pos, 1))?,
            );
            if len > MAX_LABEL_LENGTH {
                return Err(Error::InvalidLabelType {
                    offset: pos,
                    value: slice[pos],
                });
            }
            label_count += 1;
            pos += 1 + len;
            if len == 0 {
                break;
            }
            if pos > slice.len() {
                return Err(Error::truncated(pos - len, pos - slice.len()));
            }
        }

        if pos != slice.len() {
            return Err(Error::invalid_name(
                String::from_utf8_lossy(slice),
                "bytes after root label",
            ));
        }

        Ok(Self {
            wire: WireBuf::from_slice(slice),
            label_count,
        })
    }

    /// Returns the wire representation, including the root label.
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the wire length, including the root label.
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len()
    }

    /// Returns the number of labels, including the root label.
    #[inline]
    pub const fn label_count(&self) -> usize {
        self.label_count as usize
    }

    /// Returns true if this is the root name.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.label_count == 1
    }

    /// Returns an iterator over the labels, root last.
    #[inline]
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter::new(&self.wire)
    }

    /// Returns the parent name, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let skip = 1 + usize::from(self.wire[0]);
        Some(Self {
            wire: WireBuf::from_slice(&self.wire[skip..]),
            label_count: self.label_count - 1,
        })
    }

    /// Returns true if this name equals `other` or lies beneath it.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        if self.label_count < other.label_count {
            return false;
        }
        let mut ancestor = self.clone();
        for _ in 0..(self.label_count - other.label_count) {
            match ancestor.parent() {
                Some(parent) => ancestor = parent,
                None => return false,
            }
        }
        ancestor == *other
    }

    /// Renders the dot-terminated presentation form.
    pub fn to_string_representation(&self) -> CompactString {
        if self.is_root() {
            return CompactString::new(".");
        }

        let mut result = CompactString::new("");
        for label in self.labels().filter(|l| !l.is_root()) {
            result.push_str(&label.to_string());
            result.push('.');
        }
        result
    }

    pub(crate) fn from_parts(wire: WireBuf, label_count: u8) -> Self {
        Self { wire, label_count }
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a dotted name. A missing trailing dot is implied.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        let trimmed = s.strip_suffix('.').unwrap_or(s);
        let mut wire = WireBuf::new();
        let mut label_count = 0u8;

        for part in trimmed.split('.') {
            if part.is_empty() {
                return Err(Error::invalid_name(s, "empty label"));
            }
            if part.len() > MAX_LABEL_LENGTH {
                return Err(Error::LabelTooLong { length: part.len() });
            }
            if !part
                .bytes()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'*'))
            {
                return Err(Error::invalid_name(s, "invalid character in label"));
            }

            // Length checked against MAX_LABEL_LENGTH above.
            #[allow(clippy::cast_possible_truncation)]
            wire.push(part.len() as u8);
            wire.extend_from_slice(part.as_bytes());
            label_count += 1;

            if wire.len() >= MAX_NAME_LENGTH {
                return Err(Error::NameTooLong {
                    length: wire.len() + 1,
                });
            }
        }

        wire.push(0);
        label_count += 1;

        if wire.len() > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: wire.len() });
        }

        Ok(Self { wire, label_count })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_representation())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.label_count == other.label_count && self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in &self.wire {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string_representation())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
