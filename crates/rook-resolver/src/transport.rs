//! Outbound query transport.

use crate::{ResolverError, Result};
use async_trait::async_trait;
use rook_proto::{Message, MAX_UDP_MESSAGE_SIZE};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::trace;

/// Sends one query to one server and returns its decoded reply.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a single query/response exchange.
    async fn exchange(&self, server: SocketAddr, query: &Message) -> Result<Message>;
}

/// Plain UDP transport with a fresh socket per exchange.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    /// Creates a transport that gives up on a server after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn exchange_udp(&self, server: SocketAddr, query: &Message) -> Result<Message> {
        let bind: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(server).await?;

        let wire = query.to_wire()?;
        socket.send(&wire).await?;

        let mut buf = [0u8; MAX_UDP_MESSAGE_SIZE];
        let len = socket.recv(&mut buf).await?;
        trace!(server = %server, len, "Received reply");

        Message::parse(&buf[..len])
            .map_err(|e| ResolverError::Protocol(format!("undecodable reply from {server}: {e}")))
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn exchange(&self, server: SocketAddr, query: &Message) -> Result<Message> {
        timeout(self.timeout, self.exchange_udp(server, query))
            .await
            .map_err(|_| ResolverError::Timeout)?
    }
}

/// Checks that `response` answers `query`: same ID, QR set, and the same
/// question section.
pub fn validate_response(query: &Message, response: &Message) -> Result<()> {
    if response.id() != query.id() {
        return Err(ResolverError::Protocol(format!(
            "response ID {} does not match query ID {}",
            response.id(),
            query.id()
        )));
    }
    if !response.is_response() {
        return Err(ResolverError::Protocol("reply is not a response".into()));
    }
    if response.questions() != query.questions() {
        return Err(ResolverError::Protocol(format!(
            "response carries {} questions that do not match the query's {}",
            response.questions().len(),
            query.questions().len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rook_proto::{Name, Question, ResourceRecord};
    use std::str::FromStr;

    fn query() -> Message {
        Message::query(Question::a(Name::from_str("example.com.").unwrap()))
    }

    #[test]
    fn test_validate_response() {
        let query = query();
        let response = Message::response_from(&query);
        assert!(validate_response(&query, &response).is_ok());

        let mut wrong_id = response.clone();
        wrong_id.set_id(query.id().wrapping_add(1));
        assert!(validate_response(&query, &wrong_id).is_err());

        let mut not_response = response.clone();
        not_response.header_mut().set_response(false);
        assert!(validate_response(&query, &not_response).is_err());

        let mut other_question = Message::response_from(&Message::query(Question::a(
            Name::from_str("other.com.").unwrap(),
        )));
        other_question.set_id(query.id());
        assert!(validate_response(&query, &other_question).is_err());
    }

    #[test]
    fn test_validate_ignores_question_case() {
        let query = query();
        let mut response = Message::response_from(&Message::query(Question::a(
            Name::from_str("EXAMPLE.com.").unwrap(),
        )));
        response.set_id(query.id());
        assert!(validate_response(&query, &response).is_ok());
    }

    #[tokio::test]
    async fn test_udp_exchange_roundtrip() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            let query = Message::parse(&buf[..len]).unwrap();
            let mut response = Message::response_from(&query);
            response.header_mut().set_authoritative(true);
            response.add_answer(ResourceRecord::a(
                Name::from_str("example.com.").unwrap(),
                60,
                Ipv4Addr::new(192, 0, 2, 10),
            ));
            server
                .send_to(&response.to_wire().unwrap(), peer)
                .await
                .unwrap();
        });

        let transport = UdpTransport::new(Duration::from_secs(2));
        let query = query();
        let response = transport.exchange(server_addr, &query).await.unwrap();
        assert_eq!(response.id(), query.id());
        assert!(response.is_authoritative());
        assert_eq!(
            response.a_records().collect::<Vec<_>>(),
            vec![Ipv4Addr::new(192, 0, 2, 10)]
        );
    }

    #[tokio::test]
    async fn test_udp_exchange_timeout() {
        // Bound but never answers.
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let transport = UdpTransport::new(Duration::from_millis(50));
        let result = transport
            .exchange(silent.local_addr().unwrap(), &query())
            .await;
        assert!(matches!(result, Err(ResolverError::Timeout)));
    }
}
