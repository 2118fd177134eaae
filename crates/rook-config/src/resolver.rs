//! Resolver configuration.

use super::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Per-server query timeout (milliseconds).
    pub timeout_ms: u64,

    /// Delegation hops per resolution.
    pub max_iterations: u8,

    /// Nesting limit for nameserver address lookups.
    pub max_depth: u8,

    /// Outbound queries allowed per client query.
    pub max_exchanges: u32,

    /// Port outbound queries are sent to.
    pub upstream_port: u16,

    /// Root server addresses. Empty means the built-in list.
    pub root_hints: Vec<IpAddr>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            max_iterations: 3,
            max_depth: 4,
            max_exchanges: 64,
            upstream_port: 53,
            root_hints: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("resolver.timeout_ms", self.timeout_ms == 0),
            ("resolver.max_iterations", self.max_iterations == 0),
            ("resolver.max_depth", self.max_depth == 0),
            ("resolver.max_exchanges", self.max_exchanges == 0),
            ("resolver.upstream_port", self.upstream_port == 0),
        ];

        if let Some((field, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::InvalidValue {
                field: (*field).to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
