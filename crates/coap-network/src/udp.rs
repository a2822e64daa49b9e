//! UDP datagram transport backed by OS sockets

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::capability::{DatagramTransport, DATAGRAM_WRITE_FAILED};

/// Datagram transport over connected UDP sockets
///
/// `create` resolves the peer, binds an ephemeral local port of the same
/// address family and connects the socket so that reads only accept
/// datagrams from that peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpDatagramTransport;

impl UdpDatagramTransport {
    /// Create the transport
    pub fn new() -> Self {
        Self
    }

    fn connect(peer: SocketAddr) -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::for_address(peer), Type::DGRAM, Some(Protocol::UDP))?;
        let local = match peer {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        socket.bind(&local.into())?;
        socket.connect(&peer.into())?;
        Ok(socket.into())
    }
}

impl DatagramTransport for UdpDatagramTransport {
    type Socket = UdpSocket;

    fn create(&self, host: &str, port: u16) -> Option<Self::Socket> {
        let peer = match (host, port).to_socket_addrs() {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                tracing::warn!(host, port, error = %e, "failed to resolve peer");
                return None;
            }
        };
        let Some(peer) = peer else {
            tracing::warn!(host, port, "peer resolved to no addresses");
            return None;
        };

        match Self::connect(peer) {
            Ok(socket) => {
                tracing::debug!(%peer, "udp socket connected");
                Some(socket)
            }
            Err(e) => {
                tracing::warn!(%peer, error = %e, "failed to open udp socket");
                None
            }
        }
    }

    fn close(&self, socket: Self::Socket) {
        drop(socket);
    }

    fn write(&self, socket: &mut Self::Socket, data: &[u8]) -> isize {
        match socket.send(data) {
            Ok(sent) => isize::try_from(sent).unwrap_or(isize::MAX),
            Err(e) => {
                tracing::debug!(error = %e, "udp send failed");
                DATAGRAM_WRITE_FAILED
            }
        }
    }

    fn read_timeout(
        &self,
        socket: &mut Self::Socket,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> usize {
        // A zero read timeout is rejected by the OS; poll instead.
        let armed = if timeout.is_zero() {
            socket.set_nonblocking(true)
        } else {
            socket
                .set_nonblocking(false)
                .and_then(|()| socket.set_read_timeout(Some(timeout)))
        };
        if let Err(e) = armed {
            tracing::debug!(error = %e, "failed to arm udp read timeout");
            return 0;
        }

        match socket.recv(buffer) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => 0,
            Err(e) => {
                tracing::debug!(error = %e, "udp recv failed");
                0
            }
        }
    }
}
