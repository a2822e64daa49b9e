//! Network endpoint: one logical connection to a CoAP peer
//!
//! An endpoint owns exactly one transport handle, either a plain datagram
//! socket or a secure session, and routes every operation to the matching
//! capability. The handle is created by [`NetworkEndpoint::init`] and
//! released by [`NetworkEndpoint::deinit`] (or on drop). Operations are
//! synchronous and run on the caller's thread; `read` blocks for at most
//! its timeout.
//!
//! # Result conventions
//!
//! - `write` reports success or failure only. The byte count the transport
//!   returns is not surfaced.
//! - `read` reports a byte count only. On the secure path the adapter's
//!   status is logged and dropped; 0 bytes covers both a timeout and a
//!   failed read.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::{
    DatagramTransport, NoSecureTransport, SecureTransport, DATAGRAM_WRITE_FAILED,
};
use crate::error::{NetworkError, NetworkResult};
use crate::secure::SecureSessionAdapter;

/// Largest CoAP message the insecure read window is sized for
pub const MAX_PDU_LEN: usize = 1280;

/// Which transport an endpoint runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Plain datagram socket
    Insecure,
    /// Encrypted session
    Secure,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insecure => f.write_str("insecure"),
            Self::Secure => f.write_str("secure"),
        }
    }
}

/// Parameters consumed by [`NetworkEndpoint::init`]
///
/// The trust anchor is borrowed for the duration of init only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointParams<'a> {
    /// Transport kind
    pub kind: EndpointKind,
    /// Peer host name or address
    pub host: &'a str,
    /// Peer port
    pub port: u16,
    /// PEM trust anchor, required for [`EndpointKind::Secure`]
    pub trust_anchor: Option<&'a [u8]>,
}

impl<'a> EndpointParams<'a> {
    /// Parameters for a plain datagram endpoint
    pub fn insecure(host: &'a str, port: u16) -> Self {
        Self {
            kind: EndpointKind::Insecure,
            host,
            port,
            trust_anchor: None,
        }
    }

    /// Parameters for a secure endpoint
    pub fn secure(host: &'a str, port: u16, trust_anchor: &'a [u8]) -> Self {
        Self {
            kind: EndpointKind::Secure,
            host,
            port,
            trust_anchor: Some(trust_anchor),
        }
    }

    /// Check that every argument the chosen kind needs is present
    pub fn validate(&self) -> NetworkResult<()> {
        if self.host.is_empty() {
            return Err(NetworkError::invalid_parameter("host is empty"));
        }
        let anchor_missing = self.trust_anchor.map_or(true, <[u8]>::is_empty);
        if self.kind == EndpointKind::Secure && anchor_missing {
            return Err(NetworkError::invalid_parameter(
                "secure endpoint requires a trust anchor",
            ));
        }
        Ok(())
    }
}

/// Exclusively owned transport resource; each variant owns its own handle type
enum TransportHandle<D: DatagramTransport, S: SecureTransport> {
    Insecure(D::Socket),
    /// `None` once the session has been torn down after a peer close or fatal alert
    Secure(Option<S::Session>),
}

/// A connection to one peer over a datagram socket or a secure session
///
/// `S` defaults to [`NoSecureTransport`]; with it only insecure endpoints
/// can be created.
pub struct NetworkEndpoint<D: DatagramTransport, S: SecureTransport = NoSecureTransport> {
    kind: EndpointKind,
    datagram: D,
    secure: SecureSessionAdapter<S>,
    handle: Option<TransportHandle<D, S>>,
}

impl<D: DatagramTransport, S: SecureTransport> NetworkEndpoint<D, S> {
    /// Create the underlying transport described by `params`
    ///
    /// `None` stands for an absent parameter bundle and yields
    /// `InvalidParameter`. A transport that fails to produce a handle yields
    /// `NetworkInitFailed`; nothing needs to be freed in that case.
    pub fn init(
        datagram: D,
        secure: S,
        params: Option<&EndpointParams<'_>>,
    ) -> NetworkResult<Self> {
        let Some(params) = params else {
            return Err(NetworkError::invalid_parameter("endpoint parameters are absent"));
        };
        params.validate()?;

        let secure = SecureSessionAdapter::new(secure);
        let handle = match params.kind {
            EndpointKind::Insecure => {
                let socket = datagram.create(params.host, params.port).ok_or_else(|| {
                    tracing::warn!(
                        host = params.host,
                        port = params.port,
                        "udp socket create failed"
                    );
                    NetworkError::init_failed(format!(
                        "udp socket to {}:{} could not be created",
                        params.host, params.port
                    ))
                })?;
                TransportHandle::Insecure(socket)
            }
            EndpointKind::Secure => {
                if !secure.is_available() {
                    return Err(NetworkError::init_failed(
                        "secure transport support is not available",
                    ));
                }
                let session = secure
                    .create_session(params.host, params.port, params.trust_anchor)
                    .ok_or_else(|| {
                        tracing::warn!(
                            host = params.host,
                            port = params.port,
                            "secure session create failed"
                        );
                        NetworkError::init_failed(format!(
                            "secure session to {}:{} could not be created",
                            params.host, params.port
                        ))
                    })?;
                TransportHandle::Secure(Some(session))
            }
        };

        tracing::debug!(
            kind = %params.kind,
            host = params.host,
            port = params.port,
            "network endpoint initialized"
        );
        Ok(Self {
            kind: params.kind,
            datagram,
            secure,
            handle: Some(handle),
        })
    }

    /// Transport kind chosen at init
    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// Whether the transport handle can still carry traffic
    ///
    /// A secure endpoint loses its session when a read observes a peer close
    /// or fatal alert; every later read returns 0 and every write fails with
    /// `InvalidParameter`. Re-init is the only way back.
    pub fn is_session_live(&self) -> bool {
        match &self.handle {
            Some(TransportHandle::Insecure(_)) => true,
            Some(TransportHandle::Secure(session)) => session.is_some(),
            None => false,
        }
    }

    /// Send `data` to the peer
    pub fn write(&mut self, data: &[u8]) -> NetworkResult<()> {
        match self.handle.as_mut() {
            Some(TransportHandle::Secure(session)) => {
                let mut len = data.len();
                self.secure.secure_write(session, data, &mut len)
            }
            Some(TransportHandle::Insecure(socket)) => {
                let rc = self.datagram.write(socket, data);
                tracing::debug!(rc, "network write returned");
                if rc == DATAGRAM_WRITE_FAILED {
                    Err(NetworkError::write_failed("udp write returned failure"))
                } else {
                    Ok(())
                }
            }
            None => Err(NetworkError::invalid_parameter("endpoint has been released")),
        }
    }

    /// Receive one message into `buffer`, waiting at most `timeout`
    ///
    /// The buffer is zero-filled first. Insecure reads always ask the
    /// transport for a [`MAX_PDU_LEN`] window, so callers must pass a buffer
    /// at least that large; a shorter buffer is logged and read into whole.
    /// Returns the bytes placed in the buffer, never more than its length;
    /// 0 means nothing arrived.
    pub fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> usize {
        buffer.fill(0);

        let len = match self.handle.as_mut() {
            Some(TransportHandle::Secure(session)) => {
                let mut len = buffer.len();
                if let Err(err) = self.secure.secure_read(session, buffer, &mut len, timeout) {
                    tracing::debug!(%err, "secure read status dropped");
                }
                clamp_received(len, buffer.len())
            }
            Some(TransportHandle::Insecure(socket)) => {
                let window = if buffer.len() < MAX_PDU_LEN {
                    tracing::warn!(
                        capacity = buffer.len(),
                        required = MAX_PDU_LEN,
                        "read buffer smaller than max PDU"
                    );
                    &mut buffer[..]
                } else {
                    &mut buffer[..MAX_PDU_LEN]
                };
                let received = self.datagram.read_timeout(socket, window, timeout);
                clamp_received(received, window.len())
            }
            None => 0,
        };

        tracing::trace!(len, "coap recv");
        len
    }

    /// Release the transport handle
    pub fn deinit(mut self) -> NetworkResult<()> {
        self.release();
        Ok(())
    }

    fn release(&mut self) {
        match self.handle.take() {
            Some(TransportHandle::Insecure(socket)) => {
                self.datagram.close(socket);
                tracing::debug!("udp socket closed");
            }
            Some(TransportHandle::Secure(Some(session))) => {
                self.secure.free_session(session);
                tracing::debug!("secure session freed");
            }
            Some(TransportHandle::Secure(None)) | None => {}
        }
    }
}

/// Never report more bytes than the destination could hold
fn clamp_received(reported: usize, capacity: usize) -> usize {
    if reported > capacity {
        tracing::warn!(reported, capacity, "transport over-reported read length");
        capacity
    } else {
        reported
    }
}

impl<D: DatagramTransport, S: SecureTransport> Drop for NetworkEndpoint<D, S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<D: DatagramTransport, S: SecureTransport> std::fmt::Debug for NetworkEndpoint<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkEndpoint")
            .field("kind", &self.kind)
            .field("live", &self.is_session_live())
            .finish_non_exhaustive()
    }
}
