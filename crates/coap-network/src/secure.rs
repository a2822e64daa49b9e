//! Secure session adapter
//!
//! Wraps a [`SecureTransport`] with two duties beyond pass-through:
//!
//! - Status translation: the record layer's status codes collapse to
//!   success or one failure kind per operation.
//! - Self-healing teardown: a read that observes a close notify or fatal
//!   alert frees the session before returning, leaving the handle slot empty.
//!
//! A session slot is an `Option<Session>`; `None` is the absent handle and is
//! rejected with `InvalidParameter`.

use std::time::Duration;

use crate::capability::{SecureSessionOptions, SecureStatus, SecureTransport};
use crate::error::{NetworkError, NetworkResult};

/// Adapter over a secure transport capability
#[derive(Debug, Clone, Default)]
pub struct SecureSessionAdapter<S> {
    transport: S,
}

impl<S: SecureTransport> SecureSessionAdapter<S> {
    /// Wrap a secure transport
    pub fn new(transport: S) -> Self {
        Self { transport }
    }

    /// The wrapped capability
    pub fn transport(&self) -> &S {
        &self.transport
    }

    /// Whether the wrapped capability supports sessions
    pub fn is_available(&self) -> bool {
        self.transport.is_available()
    }

    /// Create a session to `host:port` validated against `trust_anchor`
    pub fn create_session(
        &self,
        host: &str,
        port: u16,
        trust_anchor: Option<&[u8]>,
    ) -> Option<S::Session> {
        let options = SecureSessionOptions {
            host,
            port,
            trust_anchor,
        };
        self.transport.create_session(&options)
    }

    /// Release a session
    pub fn free_session(&self, session: S::Session) {
        self.transport.free_session(session);
    }

    /// Read application data into `buffer`
    ///
    /// `len` is the capacity on entry and the bytes read on return. A close
    /// notify or fatal alert frees the session and empties `session`; the
    /// caller has to create a new session to continue.
    pub fn secure_read(
        &self,
        session: &mut Option<S::Session>,
        buffer: &mut [u8],
        len: &mut usize,
        timeout: Duration,
    ) -> NetworkResult<()> {
        let Some(live) = session.as_mut() else {
            *len = 0;
            return Err(NetworkError::invalid_parameter("secure session is absent"));
        };

        tracing::trace!(
            capacity = *len,
            timeout_ms = timeout.as_millis() as u64,
            "secure datagram read"
        );
        let status = self.transport.session_read(live, buffer, len, timeout);

        if status.is_terminal() {
            tracing::info!(?status, "secure session read failed, freeing session");
            if let Some(dead) = session.take() {
                self.transport.free_session(dead);
            }
        }

        if status.is_success() {
            Ok(())
        } else {
            Err(NetworkError::read_failed(format!(
                "secure session read returned {status:?}"
            )))
        }
    }

    /// Write application data
    ///
    /// Failures leave the session in place.
    pub fn secure_write(
        &self,
        session: &mut Option<S::Session>,
        data: &[u8],
        len: &mut usize,
    ) -> NetworkResult<()> {
        let Some(live) = session.as_mut() else {
            return Err(NetworkError::invalid_parameter("secure session is absent"));
        };

        let status = self.transport.session_write(live, data, len);
        if status.is_success() {
            Ok(())
        } else {
            Err(NetworkError::write_failed(format!(
                "secure session write returned {status:?}"
            )))
        }
    }
}
