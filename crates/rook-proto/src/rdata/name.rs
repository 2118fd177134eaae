//! Name-bearing record types (NS, CNAME, MX).
//!
//! Embedded names may be compressed, so each decoder reads them through the
//! shared message buffer while staying inside its RDATA window.

use crate::error::Result;
use crate::name::Name;
use crate::wire::{WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// NS record - authoritative name server (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NS {
    nsdname: Name,
}

impl NS {
    /// Creates a new NS record.
    #[inline]
    pub const fn new(nsdname: Name) -> Self {
        Self { nsdname }
    }

    /// Returns the name server's domain name.
    #[inline]
    pub const fn nsdname(&self) -> &Name {
        &self.nsdname
    }

    /// Decodes the RDATA window.
    pub fn read(window: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self::new(window.read_name()?))
    }

    /// Returns the encoded RDATA length.
    pub fn wire_len(&self) -> usize {
        self.nsdname.wire_len()
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_name(&self.nsdname)
    }
}

impl fmt::Display for NS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nsdname)
    }
}

/// CNAME record - canonical name (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CNAME {
    cname: Name,
}

impl CNAME {
    /// Creates a new CNAME record.
    #[inline]
    pub const fn new(cname: Name) -> Self {
        Self { cname }
    }

    /// Returns the canonical name.
    #[inline]
    pub const fn target(&self) -> &Name {
        &self.cname
    }

    /// Decodes the RDATA window.
    pub fn read(window: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self::new(window.read_name()?))
    }

    /// Returns the encoded RDATA length.
    pub fn wire_len(&self) -> usize {
        self.cname.wire_len()
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_name(&self.cname)
    }
}

impl fmt::Display for CNAME {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cname)
    }
}

/// MX record - mail exchange (RFC 1035).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MX {
    preference: u16,
    exchange: Name,
}

impl MX {
    /// Creates a new MX record.
    #[inline]
    pub const fn new(preference: u16, exchange: Name) -> Self {
        Self {
            preference,
            exchange,
        }
    }

    /// Returns the preference (lower is preferred).
    #[inline]
    pub const fn preference(&self) -> u16 {
        self.preference
    }

    /// Returns the mail exchanger's name.
    #[inline]
    pub const fn exchange(&self) -> &Name {
        &self.exchange
    }

    /// Decodes the RDATA window.
    pub fn read(window: &mut WireReader<'_>) -> Result<Self> {
        let preference = window.read_u16()?;
        let exchange = window.read_name()?;
        Ok(Self::new(preference, exchange))
    }

    /// Returns the encoded RDATA length.
    pub fn wire_len(&self) -> usize {
        2 + self.exchange.wire_len()
    }

    /// Encodes the RDATA.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        writer.write_u16(self.preference)?;
        writer.write_name(&self.exchange)
    }
}

impl fmt::Display for MX {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.preference, self.exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_ns_compressed_within_window() {
        // "example." at 0, RDATA at 9: "ns1" + pointer to 0.
        let data = b"\x07example\x00\x03ns1\xC0\x00";
        let mut reader = WireReader::at(data, 9);
        let mut window = reader.window(6).unwrap();
        let ns = NS::read(&mut window).unwrap();
        assert_eq!(ns.nsdname().to_string(), "ns1.example.");
        assert!(window.is_empty());
    }

    #[test]
    fn test_mx_read() {
        let data = b"\x00\x0A\x04mail\x00";
        let mx = MX::read(&mut WireReader::new(data)).unwrap();
        assert_eq!(mx.preference(), 10);
        assert_eq!(mx.exchange().to_string(), "mail.");
        assert_eq!(mx.wire_len(), data.len());
        assert_eq!(mx.to_string(), "10 mail.");
    }

    #[test]
    fn test_name_overruns_window() {
        // The name is intact in the buffer but longer than the window.
        let data = b"\x05alias\x00";
        let mut reader = WireReader::new(data);
        let mut window = reader.window(4).unwrap();
        assert!(matches!(
            CNAME::read(&mut window),
            Err(Error::TruncatedRecord { .. })
        ));
    }
}
