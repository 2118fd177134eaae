//! # Rook DNS Server
//!
//! UDP front end: receives query datagrams, hands each one to a
//! [`QueryHandler`] on its own task, and writes back whatever the handler
//! produces.
//!
//! Every datagram is processed independently. There is no shared mutable
//! state between in-flight queries and nothing is pooled.

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

pub mod handler;
pub mod udp;

pub use handler::{FailurePolicy, QueryContext, QueryHandler, RefusedHandler, ResolverHandler};
pub use udp::UdpServer;

/// Server error types.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// DNS server instance.
///
/// Runs one [`UdpServer`] per listen address until [`DnsServer::shutdown`]
/// is called.
pub struct DnsServer {
    listen: Vec<SocketAddr>,
    handler: Arc<dyn QueryHandler>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DnsServer {
    /// Creates a new DNS server.
    pub fn new(listen: Vec<SocketAddr>, handler: Arc<dyn QueryHandler>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            listen,
            handler,
            shutdown_tx,
        }
    }

    /// Returns the configured listen addresses.
    pub fn listen_addrs(&self) -> &[SocketAddr] {
        &self.listen
    }

    /// Binds every listener and serves until shutdown.
    ///
    /// Binding happens before any listener starts, so a bad address fails
    /// the whole call without serving on the others.
    pub async fn run(&self) -> Result<()> {
        if self.listen.is_empty() {
            return Err(ServerError::Config("no listen addresses".into()));
        }

        let mut servers = Vec::with_capacity(self.listen.len());
        for addr in &self.listen {
            servers.push(UdpServer::bind(*addr, self.handler.clone()).await?);
        }

        let mut handles = Vec::with_capacity(servers.len());
        for server in servers {
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            handles.push(tokio::spawn(async move {
                tokio::select! {
                    result = server.run() => result,
                    _ = shutdown_rx.recv() => Ok(()),
                }
            }));
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| ServerError::Io(std::io::Error::other(e)))??;
        }

        info!("All listeners stopped");
        Ok(())
    }

    /// Signals every listener to stop. In-flight queries are not awaited.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Returns a handle that can stop this server from another task.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}
