//! DNS response codes (RFC 1035 Section 4.1.1).

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// Response code carried in the low four bits of the fourth header octet.
///
/// Values outside the RFC 1035 set are kept verbatim in [`Self::Unknown`] so
/// a decoded header re-encodes unchanged.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    FromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum ResponseCode {
    /// No error condition.
    NoError = 0,

    /// The name server was unable to interpret the query.
    FormErr = 1,

    /// The name server was unable to process the query.
    ServFail = 2,

    /// The queried name does not exist (NameError).
    NXDomain = 3,

    /// The name server does not support the requested kind of query.
    NotImp = 4,

    /// The name server refuses to perform the operation.
    Refused = 5,

    /// Any other 4-bit value.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl ResponseCode {
    /// Returns the 4-bit value placed in the header.
    #[inline]
    pub fn header_rcode(self) -> u8 {
        u8::from(self) & 0x0F
    }

    /// Decodes the low four bits of `value`.
    #[inline]
    pub fn from_header(value: u8) -> Self {
        Self::from(value & 0x0F)
    }

    /// Returns true for `NoError`.
    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::NoError)
    }

    /// Returns true for `NXDomain`.
    #[inline]
    pub const fn is_nxdomain(self) -> bool {
        matches!(self, Self::NXDomain)
    }

    /// Returns the mnemonic.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoError => "NOERROR",
            Self::FormErr => "FORMERR",
            Self::ServFail => "SERVFAIL",
            Self::NXDomain => "NXDOMAIN",
            Self::NotImp => "NOTIMP",
            Self::Refused => "REFUSED",
            Self::Unknown(_) => "RCODE",
        }
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "RCODE{v}"),
            known => f.write_str(known.name()),
        }
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        Self::NoError
    }
}
