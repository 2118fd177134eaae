//! Address record types (A, AAAA).

use crate::error::{Error, Result};
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// A record - IPv4 address (RFC 1035).
///
/// The RDATA is exactly 4 bytes in network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct A {
    address: Ipv4Addr,
}

impl A {
    /// Creates a new A record.
    #[inline]
    pub const fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv4 address.
    #[inline]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Decodes the RDATA window.
    pub fn read(window: &mut WireReader<'_>) -> Result<Self> {
        let octets = window.read_rest();
        let octets: [u8; 4] = octets.try_into().map_err(|_| {
            Error::invalid_rdata("A", format!("expected 4 bytes, got {}", octets.len()))
        })?;
        Ok(Self::new(Ipv4Addr::from(octets)))
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.address.octets())
    }
}

impl From<Ipv4Addr> for A {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// AAAA record - IPv6 address (RFC 3596).
///
/// The RDATA is exactly 16 bytes in network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AAAA {
    address: Ipv6Addr,
}

impl AAAA {
    /// Creates a new AAAA record.
    #[inline]
    pub const fn new(address: Ipv6Addr) -> Self {
        Self { address }
    }

    /// Returns the IPv6 address.
    #[inline]
    pub const fn address(&self) -> Ipv6Addr {
        self.address
    }

    /// Decodes the RDATA window.
    pub fn read(window: &mut WireReader<'_>) -> Result<Self> {
        let octets = window.read_rest();
        let octets: [u8; 16] = octets.try_into().map_err(|_| {
            Error::invalid_rdata("AAAA", format!("expected 16 bytes, got {}", octets.len()))
        })?;
        Ok(Self::new(Ipv6Addr::from(octets)))
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_bytes(&self.address.octets())
    }
}

impl From<Ipv6Addr> for AAAA {
    fn from(address: Ipv6Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
