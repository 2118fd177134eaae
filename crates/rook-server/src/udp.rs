//! UDP server implementation.

use super::handler::{QueryContext, QueryHandler};
use super::Result;
use bytes::Bytes;
use rook_proto::MAX_UDP_MESSAGE_SIZE;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, trace};

/// UDP DNS server.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    handler: Arc<dyn QueryHandler>,
    local_addr: SocketAddr,
}

impl UdpServer {
    /// Binds a new UDP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<dyn QueryHandler>) -> Result<Self> {
        // Create socket with socket2 for more control
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, None)?;

        // Set socket options
        socket.set_reuse_address(true)?;

        #[cfg(unix)]
        socket.set_reuse_port(true)?;

        socket.set_nonblocking(true)?;

        // Bind
        socket.bind(&addr.into())?;

        // Convert to tokio socket
        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;
        let local_addr = socket.local_addr()?;

        info!(addr = %local_addr, "UDP server listening");

        Ok(Self {
            socket: Arc::new(socket),
            handler,
            local_addr,
        })
    }

    /// Returns the local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receives datagrams forever, one task per datagram.
    ///
    /// Datagrams longer than 512 octets are cut short by the receive buffer
    /// and will normally fail to decode.
    pub async fn run(&self) -> Result<()> {
        let mut buf = [0u8; MAX_UDP_MESSAGE_SIZE];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, src)) => {
                    let data = Bytes::copy_from_slice(&buf[..len]);
                    let socket = self.socket.clone();
                    let handler = self.handler.clone();

                    // Process query in a separate task
                    tokio::spawn(async move {
                        if let Err(e) = process_query(socket, handler, data, src).await {
                            debug!(error = %e, client = %src, "Error sending UDP response");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Error receiving UDP packet");
                }
            }
        }
    }
}

async fn process_query(
    socket: Arc<UdpSocket>,
    handler: Arc<dyn QueryHandler>,
    data: Bytes,
    src: SocketAddr,
) -> Result<()> {
    let ctx = QueryContext::new(src);

    // Handle query; `None` means stay silent
    match handler.handle(&data, ctx).await {
        Some(reply) => {
            socket.send_to(&reply, src).await?;
        }
        None => trace!(client = %src, "No response sent"),
    }

    Ok(())
}
