//! # Rook Resolver
//!
//! Iterative DNS resolution: walk the delegation hierarchy from the root
//! servers down to an authoritative answer, following NS referrals, using
//! glue when present and resolving nameserver addresses out of band when not.
//!
//! The only I/O seam is [`Transport`]; [`UdpTransport`] is the production
//! implementation and tests substitute canned servers.

use async_trait::async_trait;
use rook_proto::{Message, Question};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod hints;
pub mod iterative;
pub mod service;
pub mod transport;

pub use hints::{RootHints, RootServer, ROOT_SERVERS};
pub use iterative::IterativeResolver;
pub use service::{build_response, handle_query};
pub use transport::{Transport, UdpTransport};

/// Resolver error.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("codec error: {0}")]
    Codec(#[from] rook_proto::Error),

    #[error("unsupported query: {0}")]
    Unsupported(String),

    #[error("no reachable server among {attempted} candidates")]
    NoReachableServer { attempted: usize },

    #[error("timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("maximum nesting depth exceeded")]
    MaxDepthExceeded,

    #[error("exchange budget of {0} exhausted")]
    BudgetExhausted(u32),
}

impl ResolverError {
    /// Returns true if the error came from decoding the inbound query.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_malformed())
    }
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Per-exchange timeout.
    pub query_timeout: Duration,

    /// Delegation hops per resolution before giving up inconclusively.
    pub max_iterations: u8,

    /// Nesting limit for out-of-band nameserver lookups.
    pub max_depth: u8,

    /// Outbound exchanges allowed per top-level resolution, nested
    /// lookups included.
    pub max_exchanges: u32,

    /// Destination port for outbound queries.
    pub upstream_port: u16,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(2),
            max_iterations: 3,
            max_depth: 4,
            max_exchanges: 64,
            upstream_port: rook_proto::DNS_PORT,
        }
    }
}

/// Resolver trait.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves a single question.
    ///
    /// The returned message carries the final rcode and answer records; its
    /// ID is meaningless and must be replaced by the caller.
    async fn resolve(&self, question: &Question) -> Result<Message>;
}

/// Work limits shared by a resolution and every lookup nested inside it.
///
/// Depth is per-branch; the exchange counter is shared, so nested lookups
/// together cannot exceed the top-level allowance.
#[derive(Debug, Clone)]
pub struct ResolutionBudget {
    depth: u8,
    max_depth: u8,
    exchanges: Arc<AtomicU32>,
    max_exchanges: u32,
}

impl ResolutionBudget {
    /// Creates a budget for a top-level resolution.
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            depth: 0,
            max_depth: config.max_depth,
            exchanges: Arc::new(AtomicU32::new(0)),
            max_exchanges: config.max_exchanges,
        }
    }

    /// Returns the current nesting depth.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Returns the number of exchanges spent so far.
    pub fn spent(&self) -> u32 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Creates the budget for a nested lookup.
    pub fn child(&self) -> Result<Self> {
        if self.depth >= self.max_depth {
            return Err(ResolverError::MaxDepthExceeded);
        }

        Ok(Self {
            depth: self.depth + 1,
            max_depth: self.max_depth,
            exchanges: Arc::clone(&self.exchanges),
            max_exchanges: self.max_exchanges,
        })
    }

    /// Accounts for one outbound exchange.
    pub fn charge(&self) -> Result<()> {
        let spent = self.exchanges.fetch_add(1, Ordering::Relaxed);
        if spent >= self.max_exchanges {
            return Err(ResolverError::BudgetExhausted(self.max_exchanges));
        }
        Ok(())
    }
}
