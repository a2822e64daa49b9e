//! CoAP network endpoint layer
//!
//! Presents plain datagram sockets and secure sessions behind one
//! `init` / `read` / `write` / `deinit` contract for the CoAP message layer.
//! The socket and secure-record primitives come from the host through the
//! [`DatagramTransport`] and [`SecureTransport`] capabilities; this crate
//! decides which one to drive, owns the resulting handle, and normalizes
//! their return conventions into [`NetworkError`] / [`ResultCode`].
//!
//! ```no_run
//! use coap_network::{
//!     EndpointUri, NetworkEndpoint, NoSecureTransport, UdpDatagramTransport, MAX_PDU_LEN,
//! };
//! use std::time::Duration;
//!
//! let uri = EndpointUri::parse("coap://127.0.0.1:5683")?;
//! let params = uri.params(None);
//! let mut endpoint =
//!     NetworkEndpoint::init(UdpDatagramTransport::new(), NoSecureTransport, Some(&params))?;
//! endpoint.write(&[0x40, 0x00, 0x00, 0x01])?;
//! let mut buffer = [0u8; MAX_PDU_LEN];
//! let received = endpoint.read(&mut buffer, Duration::from_secs(2));
//! println!("{received} bytes");
//! endpoint.deinit()?;
//! # Ok::<(), coap_network::NetworkError>(())
//! ```

pub mod address;
pub mod capability;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod memory;
pub mod secure;
pub mod udp;

pub use address::{EndpointUri, COAPS_DEFAULT_PORT, COAP_DEFAULT_PORT};
pub use capability::{
    DatagramTransport, NoSecureTransport, SecureSessionOptions, SecureStatus, SecureTransport,
    DATAGRAM_WRITE_FAILED,
};
pub use config::{ConfigError, NetworkConfig};
pub use endpoint::{EndpointKind, EndpointParams, NetworkEndpoint, MAX_PDU_LEN};
pub use error::{NetworkError, NetworkResult, ResultCode};
pub use secure::SecureSessionAdapter;
pub use udp::UdpDatagramTransport;
