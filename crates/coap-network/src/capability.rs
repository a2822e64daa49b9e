//! Capability interfaces supplied by the host environment
//!
//! The endpoint never touches sockets or secure records directly. It drives
//! two capability sets: a [`DatagramTransport`] for plain UDP-style sockets
//! and a [`SecureTransport`] for handshake-protected sessions. Both follow
//! the host's return conventions (sentinel values, status codes) and the
//! endpoint normalizes them.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

/// Raw result the datagram write primitive reports on failure
pub const DATAGRAM_WRITE_FAILED: isize = -1;

/// Plain datagram socket capability
pub trait DatagramTransport {
    /// Socket handle owned by the endpoint between init and deinit
    type Socket;

    /// Create a socket connected to `host:port`; `None` is the failure sentinel
    fn create(&self, host: &str, port: u16) -> Option<Self::Socket>;

    /// Release a socket
    fn close(&self, socket: Self::Socket);

    /// Send one datagram, returning a signed transport result
    ///
    /// [`DATAGRAM_WRITE_FAILED`] signals failure; any other value is a
    /// transport-defined byte count.
    fn write(&self, socket: &mut Self::Socket, data: &[u8]) -> isize;

    /// Wait up to `timeout` for one datagram, returning the bytes placed in `buffer`
    fn read_timeout(&self, socket: &mut Self::Socket, buffer: &mut [u8], timeout: Duration)
        -> usize;
}

/// Status codes reported by the secure record layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecureStatus {
    /// Operation completed
    Success,
    /// The record layer rejected an argument
    InvalidParam,
    /// The trust anchor could not be parsed or used
    InvalidCaCertificate,
    /// The handshake has not finished yet
    HandshakeInProgress,
    /// The handshake failed
    HandshakeFailed,
    /// The peer sent a fatal alert
    FatalAlertMessage,
    /// The peer closed the session cleanly
    PeerCloseNotify,
    /// The session could not be created
    SessionCreateFailed,
    /// Application data could not be read
    ReadDataFailed,
}

impl SecureStatus {
    /// Whether this status leaves the session unusable
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PeerCloseNotify | Self::FatalAlertMessage)
    }

    /// Whether this status reports success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Options handed to the secure session constructor
///
/// Only the peer address and trust anchor are populated; everything else
/// stays at its default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecureSessionOptions<'a> {
    /// Peer host name or address
    pub host: &'a str,
    /// Peer port
    pub port: u16,
    /// PEM trust anchor used to validate the peer, borrowed from the caller
    pub trust_anchor: Option<&'a [u8]>,
}

/// Secure session capability
pub trait SecureTransport {
    /// Session handle owned by the endpoint between init and deinit
    type Session;

    /// Whether this capability can establish sessions at all
    fn is_available(&self) -> bool {
        true
    }

    /// Create and handshake a session; `None` signals failure
    fn create_session(&self, options: &SecureSessionOptions<'_>) -> Option<Self::Session>;

    /// Release a session
    fn free_session(&self, session: Self::Session);

    /// Read application data
    ///
    /// `len` holds the capacity on entry and the number of bytes read on return.
    fn session_read(
        &self,
        session: &mut Self::Session,
        buffer: &mut [u8],
        len: &mut usize,
        timeout: Duration,
    ) -> SecureStatus;

    /// Write application data
    ///
    /// `len` holds the bytes to send on entry and the bytes sent on return.
    fn session_write(&self, session: &mut Self::Session, data: &[u8], len: &mut usize)
        -> SecureStatus;
}

/// Secure capability for builds without secure support
///
/// Reports itself unavailable; its session type is uninhabited so no
/// secure handle can ever exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecureTransport;

impl SecureTransport for NoSecureTransport {
    type Session = Infallible;

    fn is_available(&self) -> bool {
        false
    }

    fn create_session(&self, _options: &SecureSessionOptions<'_>) -> Option<Self::Session> {
        None
    }

    fn free_session(&self, session: Self::Session) {
        match session {}
    }

    fn session_read(
        &self,
        session: &mut Self::Session,
        _buffer: &mut [u8],
        _len: &mut usize,
        _timeout: Duration,
    ) -> SecureStatus {
        match *session {}
    }

    fn session_write(
        &self,
        session: &mut Self::Session,
        _data: &[u8],
        _len: &mut usize,
    ) -> SecureStatus {
        match *session {}
    }
}

impl<T: DatagramTransport + ?Sized> DatagramTransport for Arc<T> {
    type Socket = T::Socket;

    fn create(&self, host: &str, port: u16) -> Option<Self::Socket> {
        (**self).create(host, port)
    }

    fn close(&self, socket: Self::Socket) {
        (**self).close(socket);
    }

    fn write(&self, socket: &mut Self::Socket, data: &[u8]) -> isize {
        (**self).write(socket, data)
    }

    fn read_timeout(
        &self,
        socket: &mut Self::Socket,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> usize {
        (**self).read_timeout(socket, buffer, timeout)
    }
}

impl<T: DatagramTransport + ?Sized> DatagramTransport for &T {
    type Socket = T::Socket;

    fn create(&self, host: &str, port: u16) -> Option<Self::Socket> {
        (**self).create(host, port)
    }

    fn close(&self, socket: Self::Socket) {
        (**self).close(socket);
    }

    fn write(&self, socket: &mut Self::Socket, data: &[u8]) -> isize {
        (**self).write(socket, data)
    }

    fn read_timeout(
        &self,
        socket: &mut Self::Socket,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> usize {
        (**self).read_timeout(socket, buffer, timeout)
    }
}

impl<T: SecureTransport + ?Sized> SecureTransport for Arc<T> {
    type Session = T::Session;

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn create_session(&self, options: &SecureSessionOptions<'_>) -> Option<Self::Session> {
        (**self).create_session(options)
    }

    fn free_session(&self, session: Self::Session) {
        (**self).free_session(session);
    }

    fn session_read(
        &self,
        session: &mut Self::Session,
        buffer: &mut [u8],
        len: &mut usize,
        timeout: Duration,
    ) -> SecureStatus {
        (**self).session_read(session, buffer, len, timeout)
    }

    fn session_write(
        &self,
        session: &mut Self::Session,
        data: &[u8],
        len: &mut usize,
    ) -> SecureStatus {
        (**self).session_write(session, data, len)
    }
}

impl<T: SecureTransport + ?Sized> SecureTransport for &T {
    type Session = T::Session;

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn create_session(&self, options: &SecureSessionOptions<'_>) -> Option<Self::Session> {
        (**self).create_session(options)
    }

    fn free_session(&self, session: Self::Session) {
        (**self).free_session(session);
    }

    fn session_read(
        &self,
        session: &mut Self::Session,
        buffer: &mut [u8],
        len: &mut usize,
        timeout: Duration,
    ) -> SecureStatus {
        (**self).session_read(session, buffer, len, timeout)
    }

    fn session_write(
        &self,
        session: &mut Self::Session,
        data: &[u8],
        len: &mut usize,
    ) -> SecureStatus {
        (**self).session_write(session, data, len)
    }
}
