//! Resource record data.
//!
//! [`RData`] is a sum type keyed by record type. Types without a structured
//! decoder are kept as [`Unknown`] so they survive a decode/encode cycle
//! byte for byte instead of failing the whole message.

mod address;
mod name;
mod text;
mod unknown;

pub use address::{A, AAAA};
pub use name::{CNAME, MX, NS};
pub use text::TXT;
pub use unknown::Unknown;

use crate::error::{Error, Result};
use crate::rtype::{RecordType, Type};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Type-specific record payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RData {
    /// IPv4 address.
    A(A),
    /// IPv6 address.
    AAAA(AAAA),
    /// Delegated name server.
    NS(NS),
    /// Alias target.
    CNAME(CNAME),
    /// Mail exchange.
    MX(MX),
    /// Text strings.
    TXT(TXT),
    /// Opaque payload for any other type.
    Unknown(Unknown),
}

impl RData {
    /// Decodes RDATA of type `rtype` from an RDLENGTH-sized window.
    ///
    /// The window must be consumed exactly; leftover bytes mean the RDLENGTH
    /// disagrees with the payload.
    pub fn read(rtype: Type, window: &mut WireReader<'_>) -> Result<Self> {
        let rdata = match rtype.as_known() {
            Some(RecordType::A) => Self::A(A::read(window)?),
            Some(RecordType::AAAA) => Self::AAAA(AAAA::read(window)?),
            Some(RecordType::NS) => Self::NS(NS::read(window)?),
            Some(RecordType::CNAME) => Self::CNAME(CNAME::read(window)?),
            Some(RecordType::MX) => Self::MX(MX::read(window)?),
            Some(RecordType::TXT) => Self::TXT(TXT::read(window)?),
            _ => Self::Unknown(Unknown::read(rtype.to_u16(), window)),
        };

        if !window.is_empty() {
            return Err(Error::invalid_rdata(
                rdata.type_name(),
                format!("{} bytes left over in RDATA", window.remaining()),
            ));
        }

        Ok(rdata)
    }

    /// Returns the record type this payload belongs to.
    pub fn record_type(&self) -> Type {
        match self {
            Self::A(_) => RecordType::A.into(),
            Self::AAAA(_) => RecordType::AAAA.into(),
            Self::NS(_) => RecordType::NS.into(),
            Self::CNAME(_) => RecordType::CNAME.into(),
            Self::MX(_) => RecordType::MX.into(),
            Self::TXT(_) => RecordType::TXT.into(),
            Self::Unknown(u) => Type::from_u16(u.type_code()),
        }
    }

    fn type_name(&self) -> &'static str {
        match self.record_type().as_known() {
            Some(t) => t.name(),
            None => "unknown",
        }
    }

    /// Returns the encoded length.
    pub fn wire_len(&self) -> usize {
        match self {
            Self::A(_) => 4,
            Self::AAAA(_) => 16,
            Self::NS(ns) => ns.wire_len(),
            Self::CNAME(cname) => cname.wire_len(),
            Self::MX(mx) => mx.wire_len(),
            Self::TXT(txt) => txt.wire_len(),
            Self::Unknown(u) => u.wire_len(),
        }
    }

    /// Encodes the payload.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        match self {
            Self::A(a) => a.write_to(writer),
            Self::AAAA(aaaa) => aaaa.write_to(writer),
            Self::NS(ns) => ns.write_to(writer),
            Self::CNAME(cname) => cname.write_to(writer),
            Self::MX(mx) => mx.write_to(writer),
            Self::TXT(txt) => txt.write_to(writer),
            Self::Unknown(u) => u.write_to(writer),
        }
    }

    /// Returns the IPv4 address of an A payload.
    pub fn as_a(&self) -> Option<Ipv4Addr> {
        match self {
            Self::A(a) => Some(a.address()),
            _ => None,
        }
    }

    /// Returns the IPv6 address of an AAAA payload.
    pub fn as_aaaa(&self) -> Option<Ipv6Addr> {
        match self {
            Self::AAAA(aaaa) => Some(aaaa.address()),
            _ => None,
        }
    }

    /// Returns the name server of an NS payload.
    pub fn as_ns(&self) -> Option<&crate::Name> {
        match self {
            Self::NS(ns) => Some(ns.nsdname()),
            _ => None,
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(a) => write!(f, "{a}"),
            Self::AAAA(aaaa) => write!(f, "{aaaa}"),
            Self::NS(ns) => write!(f, "{ns}"),
            Self::CNAME(cname) => write!(f, "{cname}"),
            Self::MX(mx) => write!(f, "{mx}"),
            Self::TXT(txt) => write!(f, "{txt}"),
            Self::Unknown(u) => write!(f, "{u}"),
        }
    }
}
