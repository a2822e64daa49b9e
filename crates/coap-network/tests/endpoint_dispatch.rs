//! Endpoint read/write dispatch tests
//!
//! Two conventions here are narrower than a caller might expect and the
//! tests pin them down as-is:
//!
//! - Insecure `write` drops the byte count: only the exact `-1` sentinel is
//!   a failure, so a short or zero-length send still reports success.
//! - Secure `read` drops the adapter status: a failed read and a timeout
//!   both come back as a byte count, and only the session teardown on a
//!   peer close or fatal alert is observable.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_matches::assert_matches;
use coap_network::memory::{MemoryDatagramTransport, MemorySecureTransport};
use coap_network::{
    DatagramTransport, EndpointParams, NetworkEndpoint, NetworkError, ResultCode,
    SecureSessionOptions, SecureStatus, SecureTransport, DATAGRAM_WRITE_FAILED, MAX_PDU_LEN,
};
use proptest::prelude::*;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(10);
const ANCHOR: &[u8] = b"trust-anchor";

type MemoryEndpoint<'a> = NetworkEndpoint<&'a MemoryDatagramTransport, &'a MemorySecureTransport>;

fn insecure<'a>(
    datagram: &'a MemoryDatagramTransport,
    secure: &'a MemorySecureTransport,
) -> MemoryEndpoint<'a> {
    NetworkEndpoint::init(datagram, secure, Some(&EndpointParams::insecure("host", 5683)))
        .expect("insecure init")
}

fn secure<'a>(
    datagram: &'a MemoryDatagramTransport,
    secure: &'a MemorySecureTransport,
) -> MemoryEndpoint<'a> {
    let params = EndpointParams::secure("gateway.local", 5684, ANCHOR);
    NetworkEndpoint::init(datagram, secure, Some(&params)).expect("secure init")
}

#[test]
fn test_insecure_round_trip_through_echo() {
    let datagram = MemoryDatagramTransport::loopback();
    let tls = MemorySecureTransport::new();
    let mut endpoint = insecure(&datagram, &tls);

    endpoint.write(b"ping").expect("write");
    let mut buffer = [0u8; MAX_PDU_LEN];
    let received = endpoint.read(&mut buffer, TIMEOUT);

    assert_eq!(received, 4);
    assert_eq!(&buffer[..4], b"ping");
    assert!(buffer[4..].iter().all(|b| *b == 0));
    assert_eq!(datagram.sent(), vec![b"ping".to_vec()]);

    endpoint.deinit().expect("deinit");
}

#[test]
fn test_secure_round_trip_through_echo() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::loopback();
    let mut endpoint = secure(&datagram, &tls);

    endpoint.write(b"ping").expect("write");
    let mut buffer = [0u8; 64];
    let received = endpoint.read(&mut buffer, TIMEOUT);

    assert_eq!(received, 4);
    assert_eq!(&buffer[..4], b"ping");
    assert!(datagram.sent().is_empty());
}

#[test]
fn test_insecure_write_sentinel_is_failure() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::new();
    let mut endpoint = insecure(&datagram, &tls);

    datagram.script_write_result(DATAGRAM_WRITE_FAILED);
    assert_matches!(endpoint.write(b"ping"), Err(NetworkError::WriteFailed { .. }));

    // Zero bytes sent is still a success; the count is not surfaced.
    datagram.script_write_result(0);
    assert!(endpoint.write(b"ping").is_ok());
}

#[test]
fn test_insecure_read_requests_max_pdu_window() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::new();
    let mut endpoint = insecure(&datagram, &tls);

    let mut large = vec![0u8; MAX_PDU_LEN * 2];
    endpoint.read(&mut large, TIMEOUT);
    let mut exact = vec![0u8; MAX_PDU_LEN];
    endpoint.read(&mut exact, TIMEOUT);

    assert_eq!(datagram.read_windows(), vec![MAX_PDU_LEN, MAX_PDU_LEN]);
}

#[test]
fn test_insecure_read_into_short_buffer_stays_in_bounds() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::new();
    let mut endpoint = insecure(&datagram, &tls);
    datagram.push_inbound(vec![7u8; 64]);

    let mut short = [0xFFu8; 16];
    let received = endpoint.read(&mut short, TIMEOUT);

    assert_eq!(received, 16);
    assert_eq!(datagram.read_windows(), vec![16]);
    assert_eq!(datagram.dirty_reads(), 0);
}

#[test]
fn test_secure_read_passes_capacity_as_in_out_length() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::new();
    let mut endpoint = secure(&datagram, &tls);
    tls.push_inbound(b"0123456789".to_vec());

    let mut buffer = [0u8; 6];
    let received = endpoint.read(&mut buffer, TIMEOUT);

    assert_eq!(tls.read_capacities(), vec![6]);
    assert_eq!(received, 6);
    assert_eq!(&buffer, b"012345");
}

#[test]
fn test_secure_read_failure_reports_zero_bytes() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::new();
    let mut endpoint = secure(&datagram, &tls);
    tls.script_read_status(SecureStatus::ReadDataFailed);

    let mut buffer = [0xAAu8; 32];
    assert_eq!(endpoint.read(&mut buffer, TIMEOUT), 0);
    assert!(buffer.iter().all(|b| *b == 0));
    assert_eq!(tls.dirty_reads(), 0);
    assert!(endpoint.is_session_live());
    assert_eq!(tls.free_count(), 0);
}

#[test]
fn test_secure_peer_close_tears_down_session_once() {
    for status in [SecureStatus::PeerCloseNotify, SecureStatus::FatalAlertMessage] {
        let datagram = MemoryDatagramTransport::new();
        let tls = MemorySecureTransport::new();
        let mut endpoint = secure(&datagram, &tls);
        tls.script_read_status(status);

        let mut buffer = [0xAAu8; 32];
        assert_eq!(endpoint.read(&mut buffer, TIMEOUT), 0);
        assert!(buffer.iter().all(|b| *b == 0));
        assert_eq!(tls.dirty_reads(), 0);
        assert!(!endpoint.is_session_live());
        assert_eq!(tls.free_count(), 1);

        // The dead endpoint fails cleanly instead of reaching the transport.
        buffer.fill(0xAA);
        assert_eq!(endpoint.read(&mut buffer, TIMEOUT), 0);
        assert!(buffer.iter().all(|b| *b == 0));
        let write = endpoint.write(b"ping");
        assert_eq!(ResultCode::from_result(&write), ResultCode::InvalidParameter);
        assert_eq!(tls.read_capacities().len(), 1);
        assert!(tls.sent().is_empty());

        endpoint.deinit().expect("deinit");
        assert_eq!(tls.free_count(), 1);
    }
}

#[test]
fn test_secure_write_failure_keeps_session() {
    let datagram = MemoryDatagramTransport::new();
    let tls = MemorySecureTransport::new();
    let mut endpoint = secure(&datagram, &tls);
    tls.script_write_status(SecureStatus::FatalAlertMessage);

    assert_matches!(endpoint.write(b"ping"), Err(NetworkError::WriteFailed { .. }));
    assert!(endpoint.is_session_live());
    assert_eq!(tls.free_count(), 0);

    endpoint.write(b"ping").expect("session still usable");
    endpoint.deinit().expect("deinit");
    assert_eq!(tls.free_count(), 1);
}

/// Transport that claims to have read more than it was given room for
struct OverReporting;

impl DatagramTransport for OverReporting {
    type Socket = ();

    fn create(&self, _host: &str, _port: u16) -> Option<Self::Socket> {
        Some(())
    }

    fn close(&self, _socket: Self::Socket) {}

    fn write(&self, _socket: &mut Self::Socket, data: &[u8]) -> isize {
        data.len() as isize
    }

    fn read_timeout(
        &self,
        _socket: &mut Self::Socket,
        buffer: &mut [u8],
        _timeout: Duration,
    ) -> usize {
        buffer.fill(0x11);
        5_000
    }
}

impl SecureTransport for OverReporting {
    type Session = ();

    fn create_session(&self, _options: &SecureSessionOptions<'_>) -> Option<Self::Session> {
        Some(())
    }

    fn free_session(&self, _session: Self::Session) {}

    fn session_read(
        &self,
        _session: &mut Self::Session,
        buffer: &mut [u8],
        len: &mut usize,
        _timeout: Duration,
    ) -> SecureStatus {
        buffer.fill(0x22);
        *len = 5_000;
        SecureStatus::Success
    }

    fn session_write(
        &self,
        _session: &mut Self::Session,
        _data: &[u8],
        _len: &mut usize,
    ) -> SecureStatus {
        SecureStatus::Success
    }
}

#[test]
fn test_insecure_read_never_exceeds_window() {
    let params = EndpointParams::insecure("host", 5683);
    let mut endpoint =
        NetworkEndpoint::init(OverReporting, OverReporting, Some(&params)).expect("init");

    let mut buffer = vec![0u8; MAX_PDU_LEN];
    let received = endpoint.read(&mut buffer, TIMEOUT);
    assert_eq!(received, MAX_PDU_LEN);
    assert_eq!(buffer[..received].len(), MAX_PDU_LEN);

    let mut large = vec![0u8; MAX_PDU_LEN * 2];
    assert_eq!(endpoint.read(&mut large, TIMEOUT), MAX_PDU_LEN);
    assert!(large[MAX_PDU_LEN..].iter().all(|b| *b == 0));

    let mut short = [0u8; 16];
    assert_eq!(endpoint.read(&mut short, TIMEOUT), 16);
}

#[test]
fn test_secure_read_never_exceeds_buffer() {
    let params = EndpointParams::secure("gateway.local", 5684, ANCHOR);
    let mut endpoint =
        NetworkEndpoint::init(OverReporting, OverReporting, Some(&params)).expect("init");

    let mut buffer = [0u8; 64];
    let received = endpoint.read(&mut buffer, TIMEOUT);
    assert_eq!(received, buffer.len());
    assert!(buffer[..received].iter().all(|b| *b == 0x22));
}

proptest! {
    #[test]
    fn prop_insecure_write_fails_only_on_sentinel(raw in any::<isize>()) {
        let datagram = MemoryDatagramTransport::new();
        let tls = MemorySecureTransport::new();
        let mut endpoint = insecure(&datagram, &tls);

        datagram.script_write_result(raw);
        let code = ResultCode::from_result(&endpoint.write(b"payload"));
        if raw == DATAGRAM_WRITE_FAILED {
            prop_assert_eq!(code, ResultCode::WriteFailed);
        } else {
            prop_assert_eq!(code, ResultCode::Success);
        }
    }

    #[test]
    fn prop_read_zero_fills_before_reading(
        stale in prop::collection::vec(1u8..=255, MAX_PDU_LEN..MAX_PDU_LEN + 64),
        inbound in prop::option::of(prop::collection::vec(any::<u8>(), 0..32)),
        secure_path in any::<bool>(),
    ) {
        let datagram = MemoryDatagramTransport::new();
        let tls = MemorySecureTransport::new();
        let mut endpoint = if secure_path {
            secure(&datagram, &tls)
        } else {
            insecure(&datagram, &tls)
        };
        if let Some(data) = &inbound {
            datagram.push_inbound(data.clone());
            tls.push_inbound(data.clone());
        }

        let mut buffer = stale;
        let received = endpoint.read(&mut buffer, Duration::ZERO);

        prop_assert_eq!(datagram.dirty_reads() + tls.dirty_reads(), 0);
        prop_assert!(buffer[received..].iter().all(|b| *b == 0));
        prop_assert_eq!(received, inbound.map_or(0, |data| data.len()));
    }
}
