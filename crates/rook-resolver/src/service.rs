//! Inbound query handling: raw datagram in, raw datagram out.

use crate::{Resolver, ResolverError, Result};
use bytes::Bytes;
use rook_proto::{Message, OpCode, MAX_UDP_MESSAGE_SIZE};
use tracing::trace;

/// Answers one inbound query datagram.
///
/// The query must be a standard query (QR clear, opcode QUERY) carrying
/// exactly one question; anything else is [`ResolverError::Unsupported`].
/// Decode failures surface as [`ResolverError::Codec`] so the caller can
/// tell a malformed packet from a failed resolution.
pub async fn handle_query<R: Resolver + ?Sized>(resolver: &R, packet: &[u8]) -> Result<Bytes> {
    let query = Message::parse(packet)?;

    if query.is_response() {
        return Err(ResolverError::Unsupported("message is a response".into()));
    }
    if query.opcode() != OpCode::Query {
        return Err(ResolverError::Unsupported(format!(
            "opcode {}",
            query.opcode()
        )));
    }
    let question = match query.questions() {
        [question] => question,
        questions => {
            return Err(ResolverError::Unsupported(format!(
                "{} questions",
                questions.len()
            )))
        }
    };

    trace!(id = query.id(), question = %question, "Handling query");
    let resolved = resolver.resolve(question).await?;

    Ok(build_response(&query, &resolved).to_wire()?)
}

/// Builds the reply to `query` from a resolution result.
///
/// ID, opcode, RD and the question are echoed from the query; rcode and
/// answers come from `resolved`. RA is always set. The reply is trimmed to
/// fit a UDP datagram, setting TC if answers had to go.
pub fn build_response(query: &Message, resolved: &Message) -> Message {
    let mut response = Message::response_from(query);
    response.header_mut().set_recursion_available(true);
    response.set_rcode(resolved.rcode());
    response.add_answers(resolved.answers().iter().cloned());
    response.truncate_to(MAX_UDP_MESSAGE_SIZE);
    response
}
