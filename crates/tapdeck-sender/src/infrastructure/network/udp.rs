//! UDP transport to the TapDeck receiver.
//!
//! The sender binds an ephemeral local port and sends every datagram to one
//! fixed `<host>:<port>` target (port 8888 unless configured otherwise).  UDP
//! gives no delivery or ordering guarantee; ordering between our own sends is
//! kept by the single outbound queue in front of this transport.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use super::outbound::{DatagramTransport, TransportError};

/// A connected-by-convention UDP socket with a fixed destination.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Resolves `target_host:target_port` and binds a local socket on
    /// `bind_address` with an OS-assigned port.
    ///
    /// An IPv4 wildcard bind address is swapped for the IPv6 wildcard when
    /// the target resolves to an IPv6 address.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the bind address is invalid, the target
    /// cannot be resolved, or the socket cannot be bound.
    pub async fn connect(
        bind_address: &str,
        target_host: &str,
        target_port: u16,
    ) -> Result<Self, TransportError> {
        let target = resolve(target_host, target_port).await?;

        let mut bind_ip: IpAddr = bind_address
            .parse()
            .map_err(|_| TransportError::InvalidBindAddress(bind_address.to_string()))?;
        if target.is_ipv6() && bind_ip.is_ipv4() && bind_ip.is_unspecified() {
            bind_ip = IpAddr::V6(Ipv6Addr::UNSPECIFIED);
        }
        let bind_addr = SocketAddr::new(bind_ip, 0);

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: bind_addr,
                source,
            })?;

        info!(
            local = %socket.local_addr().unwrap_or(bind_addr),
            %target,
            "UDP transport ready"
        );
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Returns the local address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the OS error if the address cannot be queried.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[async_trait]
impl DatagramTransport for UdpTransport {
    async fn send(&self, datagram: &[u8]) -> Result<(), TransportError> {
        self.socket
            .send_to(datagram, self.target)
            .await
            .map_err(TransportError::Send)?;
        debug!(bytes = datagram.len(), "datagram sent");
        Ok(())
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let display = format!("{host}:{port}");
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            target: display.clone(),
            source,
        })?;
    addrs.next().ok_or(TransportError::NoAddress(display))
}
