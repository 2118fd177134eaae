//! Complete DNS messages.

use crate::error::{Error, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::name::Name;
use crate::opcode::OpCode;
use crate::question::Question;
use crate::rcode::ResponseCode;
use crate::record::ResourceRecord;
use crate::rtype::RecordType;
use crate::wire::{WireReader, WireWriter};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Smallest possible encoded question (root name, type, class).
const MIN_QUESTION_LEN: usize = 5;

/// Smallest possible encoded record (root name, fixed fields, empty RDATA).
const MIN_RECORD_LEN: usize = 11;

/// A DNS message: header plus question, answer, authority and additional
/// sections.
///
/// The header counts are kept in step with the sections by the `add_*`
/// methods, and are recomputed from the sections on encode regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authority: Vec<ResourceRecord>,
    additional: Vec<ResourceRecord>,
}

impl Message {
    /// Creates an empty message with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header: Header {
                qd_count: 0,
                an_count: 0,
                ns_count: 0,
                ar_count: 0,
                ..header
            },
            questions: Vec::new(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Creates an iterative query for a single question.
    ///
    /// The ID is drawn from the thread-local CSPRNG and RD is left unset.
    pub fn query(question: Question) -> Self {
        let mut msg = Self::new(Header::query());
        msg.add_question(question);
        msg
    }

    /// Creates an empty response to `query`, echoing its ID, opcode, RD bit
    /// and questions.
    pub fn response_from(query: &Message) -> Self {
        let mut msg = Self::new(Header::response_from(&query.header));
        for q in &query.questions {
            msg.add_question(q.clone());
        }
        msg
    }

    /// Returns the header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the header mutably.
    ///
    /// Section counts written here are overwritten on encode.
    #[inline]
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Returns the message ID.
    #[inline]
    pub fn id(&self) -> u16 {
        self.header.id
    }

    /// Sets the message ID.
    #[inline]
    pub fn set_id(&mut self, id: u16) {
        self.header.id = id;
    }

    /// Returns the opcode.
    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.header.opcode
    }

    /// Returns the response code.
    #[inline]
    pub fn rcode(&self) -> ResponseCode {
        self.header.rcode
    }

    /// Sets the response code.
    #[inline]
    pub fn set_rcode(&mut self, rcode: ResponseCode) {
        self.header.rcode = rcode;
    }

    /// Returns true if this is a query.
    #[inline]
    pub fn is_query(&self) -> bool {
        self.header.is_query()
    }

    /// Returns true if this is a response.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.header.is_response()
    }

    /// Returns true if the AA bit is set.
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.header.is_authoritative()
    }

    /// Returns true if the TC bit is set.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.header.is_truncated()
    }

    /// Returns the question section.
    #[inline]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the first question, if any.
    #[inline]
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns the answer section.
    #[inline]
    pub fn answers(&self) -> &[ResourceRecord] {
        &self.answers
    }

    /// Returns the authority section.
    #[inline]
    pub fn authority(&self) -> &[ResourceRecord] {
        &self.authority
    }

    /// Returns the additional section.
    #[inline]
    pub fn additional(&self) -> &[ResourceRecord] {
        &self.additional
    }

    /// Appends a question.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
        self.header.qd_count = saturating_count(self.questions.len());
    }

    /// Appends an answer record.
    pub fn add_answer(&mut self, record: ResourceRecord) {
        self.answers.push(record);
        self.header.an_count = saturating_count(self.answers.len());
    }

    /// Appends answer records.
    pub fn add_answers(&mut self, records: impl IntoIterator<Item = ResourceRecord>) {
        self.answers.extend(records);
        self.header.an_count = saturating_count(self.answers.len());
    }

    /// Appends an authority record.
    pub fn add_authority(&mut self, record: ResourceRecord) {
        self.authority.push(record);
        self.header.ns_count = saturating_count(self.authority.len());
    }

    /// Appends an additional record.
    pub fn add_additional(&mut self, record: ResourceRecord) {
        self.additional.push(record);
        self.header.ar_count = saturating_count(self.additional.len());
    }

    /// Returns true for a non-authoritative response carrying NS records in
    /// the authority section.
    pub fn is_referral(&self) -> bool {
        !self.is_authoritative() && self.authority.iter().any(|r| r.rtype().is_ns())
    }

    /// Returns the targets of NS records in the authority section.
    pub fn referral_nameservers(&self) -> impl Iterator<Item = &Name> + '_ {
        self.authority.iter().filter_map(|r| r.rdata().as_ns())
    }

    /// Returns A-record addresses owned by `owner` in the additional section.
    pub fn glue_for<'a>(&'a self, owner: &'a Name) -> impl Iterator<Item = Ipv4Addr> + 'a {
        self.additional
            .iter()
            .filter(move |r| r.name() == owner)
            .filter_map(|r| r.rdata().as_a())
    }

    /// Returns the addresses of A records in the answer section.
    pub fn a_records(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.answers
            .iter()
            .filter(|r| r.rtype() == RecordType::A)
            .filter_map(|r| r.rdata().as_a())
    }

    /// Decodes a message.
    ///
    /// Every section is sized exactly from its header count. Bytes after the
    /// last record are ignored.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Header::parse(data)?;
        let mut reader = WireReader::at(data, HEADER_SIZE);

        let mut questions =
            Vec::with_capacity(bounded_capacity(header.qd_count, &reader, MIN_QUESTION_LEN));
        for _ in 0..header.qd_count {
            questions.push(Question::read(&mut reader)?);
        }

        let answers = read_records(&mut reader, header.an_count)?;
        let authority = read_records(&mut reader, header.ns_count)?;
        let additional = read_records(&mut reader, header.ar_count)?;

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }

    /// Returns the encoded size.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE
            + self.questions.iter().map(Question::wire_len).sum::<usize>()
            + [&self.answers, &self.authority, &self.additional]
                .iter()
                .flat_map(|section| section.iter())
                .map(ResourceRecord::wire_len)
                .sum::<usize>()
    }

    /// Encodes the message into `writer` with counts taken from the sections.
    pub fn write_to(&self, writer: &mut WireWriter) -> Result<()> {
        let header = Header {
            qd_count: section_count("question", self.questions.len())?,
            an_count: section_count("answer", self.answers.len())?,
            ns_count: section_count("authority", self.authority.len())?,
            ar_count: section_count("additional", self.additional.len())?,
            ..self.header.clone()
        };
        header.write_to(writer)?;

        for q in &self.questions {
            q.write_to(writer)?;
        }
        for r in self
            .answers
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            r.write_to(writer)?;
        }
        Ok(())
    }

    /// Encodes the message without compression.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut writer = WireWriter::new(self.wire_len());
        self.write_to(&mut writer)?;
        Ok(writer.freeze())
    }

    /// Drops records until the encoded message fits in `max_size` bytes.
    ///
    /// Additional records go first, then authority, then answers. TC is set
    /// when an answer or authority record had to be removed.
    pub fn truncate_to(&mut self, max_size: usize) {
        let mut lost_data = false;

        while self.wire_len() > max_size {
            if self.additional.pop().is_some() {
                continue;
            }
            if self.authority.pop().is_some() {
                lost_data = true;
                continue;
            }
            if self.answers.pop().is_some() {
                lost_data = true;
                continue;
            }
            break;
        }

        if lost_data {
            self.header.set_truncated(true);
        }

        self.header.an_count = saturating_count(self.answers.len());
        self.header.ns_count = saturating_count(self.authority.len());
        self.header.ar_count = saturating_count(self.additional.len());
    }
}

fn read_records(reader: &mut WireReader<'_>, count: u16) -> Result<Vec<ResourceRecord>> {
    let mut records = Vec::with_capacity(bounded_capacity(count, reader, MIN_RECORD_LEN));
    for _ in 0..count {
        records.push(ResourceRecord::read(reader)?);
    }
    Ok(records)
}

/// Caps preallocation by what the remaining bytes could possibly hold.
fn bounded_capacity(count: u16, reader: &WireReader<'_>, min_len: usize) -> usize {
    usize::from(count).min(reader.remaining() / min_len)
}

fn section_count(section: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| Error::SectionTooLarge {
        section,
        count: len,
    })
}

fn saturating_count(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

impl Default for Message {
    fn default() -> Self {
        Self::new(Header::default())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";; ->>HEADER<<- {}", self.header)?;

        writeln!(f, "\n;; QUESTION SECTION:")?;
        for q in &self.questions {
            writeln!(f, ";{q}")?;
        }

        for (title, section) in [
            ("ANSWER", &self.answers),
            ("AUTHORITY", &self.authority),
            ("ADDITIONAL", &self.additional),
        ] {
            if !section.is_empty() {
                writeln!(f, "\n;; {title} SECTION:")?;
                for r in section {
                    writeln!(f, "{r}")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::RecordClass;
    use crate::header::HeaderFlags;
    use std::net::Ipv6Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    #[test]
    fn test_query_creation() {
        let msg = Message::query(Question::a(name("example.com")));
        assert!(msg.is_query());
        assert!(!msg.header().recursion_desired());
        assert_eq!(msg.opcode(), OpCode::Query);
        assert_eq!(msg.header().qd_count, 1);
        assert_eq!(msg.questions().len(), 1);
    }

    #[test]
    fn test_round_trip_all_sections() {
        let mut msg = Message::query(Question::new(
            name("example.com."),
            RecordType::A,
            RecordClass::IN,
        ));
        msg.header_mut().flags = HeaderFlags::QR | HeaderFlags::AA;
        msg.set_rcode(ResponseCode::NoError);
        msg.add_answer(ResourceRecord::a(
            name("example.com."),
            300,
            Ipv4Addr::new(93, 184, 216, 34),
        ));
        msg.add_answer(ResourceRecord::aaaa(
            name("example.com."),
            300,
            Ipv6Addr::LOCALHOST,
        ));
        msg.add_answer(ResourceRecord::cname(
            name("www.example.com."),
            60,
            name("example.com."),
        ));
        msg.add_answer(ResourceRecord::mx(
            name("example.com."),
            60,
            10,
            name("mail.example.com."),
        ));
        msg.add_answer(ResourceRecord::txt(name("example.com."), 60, "v=spf1 -all"));
        msg.add_authority(ResourceRecord::ns(
            name("example.com."),
            86400,
            name("ns1.example.com."),
        ));
        msg.add_additional(ResourceRecord::a(
            name("ns1.example.com."),
            86400,
            Ipv4Addr::new(192, 0, 2, 1),
        ));

        let wire = msg.to_wire().unwrap();
        assert_eq!(wire.len(), msg.wire_len());
        let parsed = Message::parse(&wire).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_section_counts_match_header() {
        let msg = Message::query(Question::a(name("a.example.")));
        let parsed = Message::parse(&msg.to_wire().unwrap()).unwrap();
        assert_eq!(parsed.questions().len(), 1);
        assert!(parsed.answers().is_empty());
        assert!(parsed.authority().is_empty());
        assert!(parsed.additional().is_empty());

        let header_only = Header::new(7).to_wire();
        let parsed = Message::parse(&header_only).unwrap();
        assert!(parsed.questions().is_empty());
    }

    #[test]
    fn test_count_exceeds_data() {
        let mut wire = Message::query(Question::a(name("a.example.")))
            .to_wire()
            .unwrap()
            .to_vec();
        // Claim one answer that is not there.
        wire[7] = 1;
        assert!(matches!(
            Message::parse(&wire),
            Err(Error::TruncatedRecord { .. })
        ));
    }

    #[test]
    fn test_decode_compressed_response() {
        // Response to google.com A with an answer whose owner points at the
        // question name (offset 12).
        let mut wire = vec![
            0x12, 0x34, 0x84, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        wire.extend_from_slice(b"\x06google\x03com\x00\x00\x01\x00\x01");
        wire.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0x0E, 0x10, 0, 4]);
        wire.extend_from_slice(&[93, 184, 216, 34]);

        let msg = Message::parse(&wire).unwrap();
        assert!(msg.is_authoritative());
        assert_eq!(msg.answers().len(), 1);
        assert_eq!(msg.answers()[0].name().to_string(), "google.com.");
        assert_eq!(msg.answers()[0].ttl(), 3600);
        assert_eq!(
            msg.a_records().collect::<Vec<_>>(),
            vec![Ipv4Addr::new(93, 184, 216, 34)]
        );
    }

    #[test]
    fn test_referral_helpers() {
        let mut msg = Message::default();
        msg.header_mut().set_response(true);
        msg.add_authority(ResourceRecord::ns(
            name("example."),
            3600,
            name("NS1.example."),
        ));
        msg.add_additional(ResourceRecord::a(
            name("ns1.EXAMPLE."),
            3600,
            Ipv4Addr::new(192, 0, 2, 1),
        ));
        msg.add_additional(ResourceRecord::a(
            name("other.example."),
            3600,
            Ipv4Addr::new(192, 0, 2, 99),
        ));

        assert!(msg.is_referral());
        let ns: Vec<_> = msg.referral_nameservers().cloned().collect();
        assert_eq!(ns, vec![name("ns1.example.")]);
        let glue: Vec<_> = msg.glue_for(&ns[0]).collect();
        assert_eq!(glue, vec![Ipv4Addr::new(192, 0, 2, 1)]);
    }

    #[test]
    fn test_response_from_echoes_query() {
        let mut query = Message::query(Question::a(name("example.com")));
        query.header_mut().set_recursion_desired(true);
        let response = Message::response_from(&query);
        assert_eq!(response.id(), query.id());
        assert!(response.is_response());
        assert!(response.header().recursion_desired());
        assert_eq!(response.questions(), query.questions());
    }

    #[test]
    fn test_truncate_to_udp_limit() {
        let mut msg = Message::query(Question::a(name("big.example.")));
        for i in 0..40u8 {
            msg.add_answer(ResourceRecord::a(
                name("big.example."),
                60,
                Ipv4Addr::new(10, 0, 0, i),
            ));
        }
        assert!(msg.wire_len() > 512);

        msg.truncate_to(512);
        assert!(msg.wire_len() <= 512);
        assert!(msg.is_truncated());
        assert_eq!(usize::from(msg.header().an_count), msg.answers().len());

        let parsed = Message::parse(&msg.to_wire().unwrap()).unwrap();
        assert_eq!(parsed.answers().len(), msg.answers().len());
    }

    #[test]
    fn test_truncate_drops_additional_silently() {
        let mut msg = Message::query(Question::a(name("example.")));
        msg.add_answer(ResourceRecord::a(name("example."), 1, Ipv4Addr::LOCALHOST));
        msg.add_additional(ResourceRecord::txt(name("example."), 1, vec![b'x'; 600]));
        msg.truncate_to(512);
        assert!(msg.additional().is_empty());
        assert_eq!(msg.answers().len(), 1);
        assert!(!msg.is_truncated());
    }

    #[test]
    fn test_display() {
        let mut msg = Message::query(Question::a(name("example.com")));
        msg.add_answer(ResourceRecord::a(name("example.com"), 60, Ipv4Addr::LOCALHOST));
        let text = msg.to_string();
        assert!(text.contains(";; QUESTION SECTION:"));
        assert!(text.contains(";example.com.\tIN\tA"));
        assert!(text.contains(";; ANSWER SECTION:"));
        assert!(!text.contains("AUTHORITY SECTION"));
    }
}
