//! Query handler interface.

use async_trait::async_trait;
use bytes::Bytes;
use rook_proto::{Message, ResponseCode};
use rook_resolver::{handle_query, Resolver};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Context for a DNS query.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Client address.
    pub client: SocketAddr,

    /// When the query was received.
    pub received_at: Instant,
}

impl QueryContext {
    /// Creates a new query context.
    pub fn new(client: SocketAddr) -> Self {
        Self {
            client,
            received_at: Instant::now(),
        }
    }

    /// Returns the elapsed time since the query was received.
    pub fn elapsed(&self) -> Duration {
        self.received_at.elapsed()
    }
}

/// Query handler trait.
///
/// Takes a raw query datagram and returns the raw reply, or `None` to send
/// nothing back.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Handles a DNS query.
    async fn handle(&self, packet: &[u8], context: QueryContext) -> Option<Bytes>;
}

/// What to send back when resolution fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Send nothing; the client times out.
    #[default]
    Drop,
    /// Send a SERVFAIL echoing the query.
    Servfail,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Drop => write!(f, "drop"),
            FailurePolicy::Servfail => write!(f, "servfail"),
        }
    }
}

/// Answers queries by full resolution.
pub struct ResolverHandler {
    resolver: Arc<dyn Resolver>,
    policy: FailurePolicy,
}

impl ResolverHandler {
    /// Creates a handler over `resolver`.
    pub fn new(resolver: Arc<dyn Resolver>, policy: FailurePolicy) -> Self {
        Self { resolver, policy }
    }

    /// Returns the failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}

#[async_trait]
impl QueryHandler for ResolverHandler {
    async fn handle(&self, packet: &[u8], context: QueryContext) -> Option<Bytes> {
        match handle_query(&*self.resolver, packet).await {
            Ok(reply) => {
                debug!(
                    client = %context.client,
                    elapsed_ms = context.elapsed().as_millis() as u64,
                    "Query answered"
                );
                Some(reply)
            }
            Err(e) if e.is_malformed() => {
                trace!(client = %context.client, error = %e, "Dropping malformed query");
                None
            }
            Err(e) => {
                debug!(
                    client = %context.client,
                    error = %e,
                    policy = %self.policy,
                    "Query failed"
                );
                match self.policy {
                    FailurePolicy::Drop => None,
                    FailurePolicy::Servfail => servfail(packet),
                }
            }
        }
    }
}

/// A minimal SERVFAIL reply, if the query decodes.
fn servfail(packet: &[u8]) -> Option<Bytes> {
    let query = Message::parse(packet).ok()?;
    let mut response = Message::response_from(&query);
    response.header_mut().set_recursion_available(true);
    response.set_rcode(ResponseCode::ServFail);
    response.to_wire().ok()
}

/// A handler that returns REFUSED for every decodable query.
/// Useful for testing.
pub struct RefusedHandler;

#[async_trait]
impl QueryHandler for RefusedHandler {
    async fn handle(&self, packet: &[u8], _context: QueryContext) -> Option<Bytes> {
        let query = Message::parse(packet).ok()?;
        let mut response = Message::response_from(&query);
        response.set_rcode(ResponseCode::Refused);
        response.to_wire().ok()
    }
}
