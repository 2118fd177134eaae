//! # Rook DNS Wire Codec
//!
//! Typed DNS messages and their RFC 1035 wire representation.
//!
//! Decoding understands label compression (back-pointers into the same
//! message); encoding always writes uncompressed names. Only a small set of
//! record types carries structured RDATA; everything else round-trips as
//! opaque bytes.
//!
//! ## Example
//!
//! ```rust
//! use rook_proto::{Message, Question, RecordType};
//! use std::str::FromStr;
//!
//! let query = Message::query(Question::new(
//!     rook_proto::Name::from_str("example.com.").unwrap(),
//!     RecordType::A,
//!     rook_proto::RecordClass::IN,
//! ));
//!
//! let wire = query.to_wire().unwrap();
//! let parsed = Message::parse(&wire).unwrap();
//! assert_eq!(parsed.questions(), query.questions());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod class;
pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod opcode;
pub mod question;
pub mod rcode;
pub mod rdata;
pub mod record;
pub mod rtype;
pub mod wire;

pub use class::{Class, RecordClass};
pub use error::{Error, Result};
pub use header::{Header, HeaderFlags};
pub use message::Message;
pub use name::Name;
pub use opcode::OpCode;
pub use question::Question;
pub use rcode::ResponseCode;
pub use rdata::RData;
pub use record::ResourceRecord;
pub use rtype::{RecordType, Type};

/// Maximum length of a DNS label (63 bytes per RFC 1035)
pub const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length of a domain name (255 bytes per RFC 1035)
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum size of a UDP DNS message without EDNS0 (512 bytes per RFC 1035)
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

/// DNS port (53)
pub const DNS_PORT: u16 = 53;
