//! In-memory transports for testing and local loopback
//!
//! Both capabilities keep every call in a shared ledger so tests can check
//! how the endpoint drove them: how many handles were created and released,
//! which read windows were requested, and whether the destination buffer
//! was already cleared when a read reached the transport.
//!
//! The per-call history (payloads sent, read sizes) grows with every call.
//! Long-running loops such as benchmarks should build the transports with
//! `without_history()` or call `clear_history()`; the counters keep working
//! either way.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::capability::{
    DatagramTransport, SecureSessionOptions, SecureStatus, SecureTransport, DATAGRAM_WRITE_FAILED,
};

/// Socket handle issued by [`MemoryDatagramTransport`]
#[derive(Debug, PartialEq, Eq)]
pub struct MemorySocket {
    id: u64,
    peer: String,
}

impl MemorySocket {
    /// Handle identifier, unique per transport
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The `host:port` this socket was created for
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[derive(Debug, Default)]
struct DatagramLedger {
    echo: bool,
    quiet: bool,
    fail_create: bool,
    scripted_writes: VecDeque<isize>,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    next_id: u64,
    created: usize,
    closed: usize,
    read_windows: Vec<usize>,
    dirty_reads: usize,
}

/// In-memory datagram transport
///
/// In echo mode every successful write is queued for the next read, which
/// makes a single endpoint talk to itself.
#[derive(Debug, Default)]
pub struct MemoryDatagramTransport {
    ledger: Mutex<DatagramLedger>,
}

impl MemoryDatagramTransport {
    /// Create a transport that does not echo
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that loops every write back to the reader
    pub fn loopback() -> Self {
        let transport = Self::default();
        transport.ledger.lock().echo = true;
        transport
    }

    /// Stop recording sent payloads and read windows
    pub fn without_history(self) -> Self {
        self.ledger.lock().quiet = true;
        self
    }

    /// Drop the recorded sent payloads and read windows
    pub fn clear_history(&self) {
        let mut ledger = self.ledger.lock();
        ledger.sent.clear();
        ledger.read_windows.clear();
    }

    /// Make every following `create` return the failure sentinel
    pub fn fail_create(&self) {
        self.ledger.lock().fail_create = true;
    }

    /// Queue the raw result the next `write` reports
    pub fn script_write_result(&self, result: isize) {
        self.ledger.lock().scripted_writes.push_back(result);
    }

    /// Queue a datagram for the next read
    pub fn push_inbound(&self, datagram: Vec<u8>) {
        self.ledger.lock().inbound.push_back(datagram);
    }

    /// Datagrams written so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.ledger.lock().sent.clone()
    }

    /// Number of sockets created
    pub fn created_count(&self) -> usize {
        self.ledger.lock().created
    }

    /// Number of sockets closed
    pub fn closed_count(&self) -> usize {
        self.ledger.lock().closed
    }

    /// Sockets created but not yet closed
    pub fn live_sockets(&self) -> usize {
        let ledger = self.ledger.lock();
        ledger.created - ledger.closed
    }

    /// Window sizes the reads asked for, in call order
    pub fn read_windows(&self) -> Vec<usize> {
        self.ledger.lock().read_windows.clone()
    }

    /// Reads that reached the transport with a non-zero byte in the buffer
    pub fn dirty_reads(&self) -> usize {
        self.ledger.lock().dirty_reads
    }
}

impl DatagramTransport for MemoryDatagramTransport {
    type Socket = MemorySocket;

    fn create(&self, host: &str, port: u16) -> Option<Self::Socket> {
        let mut ledger = self.ledger.lock();
        if ledger.fail_create {
            return None;
        }
        ledger.next_id += 1;
        ledger.created += 1;
        Some(MemorySocket {
            id: ledger.next_id,
            peer: format!("{host}:{port}"),
        })
    }

    fn close(&self, _socket: Self::Socket) {
        self.ledger.lock().closed += 1;
    }

    fn write(&self, _socket: &mut Self::Socket, data: &[u8]) -> isize {
        let mut ledger = self.ledger.lock();
        if !ledger.quiet {
            ledger.sent.push(data.to_vec());
        }

        let result = ledger
            .scripted_writes
            .pop_front()
            .unwrap_or(data.len() as isize);
        if ledger.echo && result != DATAGRAM_WRITE_FAILED {
            ledger.inbound.push_back(data.to_vec());
        }
        result
    }

    fn read_timeout(
        &self,
        _socket: &mut Self::Socket,
        buffer: &mut [u8],
        _timeout: Duration,
    ) -> usize {
        let mut ledger = self.ledger.lock();
        if !ledger.quiet {
            ledger.read_windows.push(buffer.len());
        }
        if buffer.iter().any(|b| *b != 0) {
            ledger.dirty_reads += 1;
        }

        match ledger.inbound.pop_front() {
            Some(datagram) => {
                let n = datagram.len().min(buffer.len());
                buffer[..n].copy_from_slice(&datagram[..n]);
                n
            }
            None => 0,
        }
    }
}

/// Session handle issued by [`MemorySecureTransport`]
#[derive(Debug, PartialEq, Eq)]
pub struct MemorySession {
    id: u64,
}

impl MemorySession {
    /// Handle identifier, unique per transport
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Owned copy of the options a session was created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSessionOptions {
    /// Peer host
    pub host: String,
    /// Peer port
    pub port: u16,
    /// Trust anchor bytes, if any were passed
    pub trust_anchor: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct SecureLedger {
    echo: bool,
    quiet: bool,
    fail_create: bool,
    read_statuses: VecDeque<SecureStatus>,
    write_statuses: VecDeque<SecureStatus>,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    next_id: u64,
    created_with: Vec<RecordedSessionOptions>,
    freed: usize,
    read_capacities: Vec<usize>,
    dirty_reads: usize,
}

/// In-memory secure transport with scripted statuses
///
/// Statuses queued with [`script_read_status`](Self::script_read_status) and
/// [`script_write_status`](Self::script_write_status) are returned in order;
/// once a queue is empty the operation succeeds.
#[derive(Debug, Default)]
pub struct MemorySecureTransport {
    ledger: Mutex<SecureLedger>,
}

impl MemorySecureTransport {
    /// Create a transport that does not echo
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that loops every write back to the reader
    pub fn loopback() -> Self {
        let transport = Self::default();
        transport.ledger.lock().echo = true;
        transport
    }

    /// Stop recording sent records and read capacities
    pub fn without_history(self) -> Self {
        self.ledger.lock().quiet = true;
        self
    }

    /// Drop the recorded sent records and read capacities
    pub fn clear_history(&self) {
        let mut ledger = self.ledger.lock();
        ledger.sent.clear();
        ledger.read_capacities.clear();
    }

    /// Make every following `create_session` fail
    pub fn fail_create(&self) {
        self.ledger.lock().fail_create = true;
    }

    /// Queue the status the next read reports
    pub fn script_read_status(&self, status: SecureStatus) {
        self.ledger.lock().read_statuses.push_back(status);
    }

    /// Queue the status the next write reports
    pub fn script_write_status(&self, status: SecureStatus) {
        self.ledger.lock().write_statuses.push_back(status);
    }

    /// Queue application data for the next successful read
    pub fn push_inbound(&self, record: Vec<u8>) {
        self.ledger.lock().inbound.push_back(record);
    }

    /// Application data written so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.ledger.lock().sent.clone()
    }

    /// Options of every session created, in order
    pub fn created_with(&self) -> Vec<RecordedSessionOptions> {
        self.ledger.lock().created_with.clone()
    }

    /// Number of sessions freed
    pub fn free_count(&self) -> usize {
        self.ledger.lock().freed
    }

    /// Sessions created but not yet freed
    pub fn live_sessions(&self) -> usize {
        let ledger = self.ledger.lock();
        ledger.created_with.len() - ledger.freed
    }

    /// In/out capacities the reads started with, in call order
    pub fn read_capacities(&self) -> Vec<usize> {
        self.ledger.lock().read_capacities.clone()
    }

    /// Reads that reached the transport with a non-zero byte in the buffer
    pub fn dirty_reads(&self) -> usize {
        self.ledger.lock().dirty_reads
    }
}

impl SecureTransport for MemorySecureTransport {
    type Session = MemorySession;

    fn create_session(&self, options: &SecureSessionOptions<'_>) -> Option<Self::Session> {
        let mut ledger = self.ledger.lock();
        if ledger.fail_create {
            return None;
        }
        ledger.created_with.push(RecordedSessionOptions {
            host: options.host.to_string(),
            port: options.port,
            trust_anchor: options.trust_anchor.map(<[u8]>::to_vec),
        });
        ledger.next_id += 1;
        Some(MemorySession { id: ledger.next_id })
    }

    fn free_session(&self, _session: Self::Session) {
        self.ledger.lock().freed += 1;
    }

    fn session_read(
        &self,
        _session: &mut Self::Session,
        buffer: &mut [u8],
        len: &mut usize,
        _timeout: Duration,
    ) -> SecureStatus {
        let mut ledger = self.ledger.lock();
        if !ledger.quiet {
            ledger.read_capacities.push(*len);
        }
        if buffer.iter().any(|b| *b != 0) {
            ledger.dirty_reads += 1;
        }

        let status = ledger
            .read_statuses
            .pop_front()
            .unwrap_or(SecureStatus::Success);
        if !status.is_success() {
            *len = 0;
            return status;
        }

        let capacity = (*len).min(buffer.len());
        *len = match ledger.inbound.pop_front() {
            Some(record) => {
                let n = record.len().min(capacity);
                buffer[..n].copy_from_slice(&record[..n]);
                n
            }
            None => 0,
        };
        status
    }

    fn session_write(
        &self,
        _session: &mut Self::Session,
        data: &[u8],
        len: &mut usize,
    ) -> SecureStatus {
        let mut ledger = self.ledger.lock();
        let n = (*len).min(data.len());
        if !ledger.quiet {
            ledger.sent.push(data[..n].to_vec());
        }

        let status = ledger
            .write_statuses
            .pop_front()
            .unwrap_or(SecureStatus::Success);
        if status.is_success() {
            *len = n;
            if ledger.echo {
                ledger.inbound.push_back(data[..n].to_vec());
            }
        } else {
            *len = 0;
        }
        status
    }
}
