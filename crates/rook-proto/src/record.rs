//! DNS resource records.

use crate::class::{Class, RecordClass};
use crate::error::{Error, Result};
use crate::name::Name;
use crate::rdata::{self, RData};
use crate::rtype::Type;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A DNS resource record.
///
/// # Wire Format
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// /                      NAME                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TYPE                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                     CLASS                     |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      TTL                      |
/// |                                               |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                   RDLENGTH                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
/// /                     RDATA                     /
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// RDLENGTH is derived from the payload when encoding. The TTL is carried
/// but never acted on, since nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecord {
    name: Name,
    rtype: Type,
    rclass: Class,
    ttl: u32,
    rdata: RData,
}

impl ResourceRecord {
    /// Creates a record whose type is taken from the payload.
    pub fn new(name: Name, rclass: Class, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            rtype: rdata.record_type(),
            rclass,
            ttl,
            rdata,
        }
    }

    /// Creates an IN A record.
    pub fn a(name: Name, ttl: u32, addr: Ipv4Addr) -> Self {
        Self::new(name, RecordClass::IN.into(), ttl, RData::A(addr.into()))
    }

    /// Creates an IN AAAA record.
    pub fn aaaa(name: Name, ttl: u32, addr: Ipv6Addr) -> Self {
        Self::new(name, RecordClass::IN.into(), ttl, RData::AAAA(addr.into()))
    }

    /// Creates an IN NS record.
    pub fn ns(name: Name, ttl: u32, nsdname: Name) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::NS(rdata::NS::new(nsdname)),
        )
    }

    /// Creates an IN CNAME record.
    pub fn cname(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::CNAME(rdata::CNAME::new(target)),
        )
    }

    /// Creates an IN MX record.
    pub fn mx(name: Name, ttl: u32, preference: u16, exchange: Name) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::MX(rdata::MX::new(preference, exchange)),
        )
    }

    /// Creates an IN TXT record.
    pub fn txt(name: Name, ttl: u32, text: impl AsRef<[u8]>) -> Self {
        Self::new(
            name,
            RecordClass::IN.into(),
            ttl,
            RData::TXT(rdata::TXT::new(text)),
        )
    }

    /// Returns the owner name.
    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the record type.
    #[inline]
    pub fn rtype(&self) -> Type {
        self.rtype
    }

    /// Returns the record class.
    #[inline]
    pub fn rclass(&self) -> Class {
        self.rclass
    }

    /// Returns the TTL in seconds.
    #[inline]
    pub const fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Returns the payload.
    #[inline]
    pub fn rdata(&self) -> &RData {
        &self.rdata
    }

    /// Returns the RDLENGTH this record encodes with.
    #[inline]
    pub fn rdlength(&self) -> usize {
        self.rdata.wire_len()
    }

    /// Decodes a record at the reader's cursor.
    ///
    /// The payload decoder only sees the RDLENGTH window; anything that
    /// would read past it fails with `TruncatedRecord`.
    pub fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let name = reader.read_name()?;
        let rtype = Type::from_u16(reader.read_u16()?);
        let rclass = Class::from_u16(reader.read_u16()?);
        let ttl = reader.read_u32()?;
        let rdlength = usize::from(reader.read_u16()?);

        let mut window = reader.window(rdlength)?;
        let rdata = RData::read(rtype, &mut window)?;

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        })
    }

    /// Returns the encoded size.
    pub fn wire_len(&self) -> usize {
        self.name.wire_len() + 10 + self.rdata.wire_len()
    }

    /// Encodes the record without name compression.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_name(&self.name)?;
        writer.write_u16(self.rtype.to_u16())?;
        writer.write_u16(self.rclass.to_u16())?;
        writer.write_u32(self.ttl)?;

        let rdlength_at = writer.len();
        writer.write_u16(0)?;
        self.rdata.write_to(writer)?;

        let rdlength = writer.len() - rdlength_at - 2;
        let rdlength = u16::try_from(rdlength).map_err(|_| Error::BufferOverflow {
            needed: rdlength,
            available: usize::from(u16::MAX),
        })?;
        writer.write_at(rdlength_at, &rdlength.to_be_bytes());
        Ok(())
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.rclass, self.rtype, self.rdata
        )
    }
}
