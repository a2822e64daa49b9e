//! Endpoint configuration
//!
//! TOML-backed settings for opening an endpoint: where to connect, how long
//! a read may block, the trust anchor for secure endpoints, and the size of
//! the receive buffer handed to `read`.
//!
//! ```toml
//! endpoint = "coaps://gateway.local"
//! read_timeout_ms = 2000
//! trust_anchor_path = "/etc/coap/ca.pem"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::{EndpointUri, COAP_DEFAULT_PORT};
use crate::endpoint::{EndpointKind, MAX_PDU_LEN};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The TOML document did not parse
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Peer to connect to; the scheme picks the endpoint kind
    pub endpoint: EndpointUri,

    /// Upper bound on how long a read blocks, in milliseconds
    pub read_timeout_ms: u64,

    /// PEM trust anchor, required for `coaps://` endpoints
    pub trust_anchor_path: Option<PathBuf>,

    /// Size of the receive buffer passed to `read`
    pub read_buffer_len: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointUri::new(EndpointKind::Insecure, "localhost", COAP_DEFAULT_PORT),
            // CoAP ACK_TIMEOUT
            read_timeout_ms: 2_000,
            trust_anchor_path: None,
            read_buffer_len: MAX_PDU_LEN,
        }
    }
}

impl NetworkConfig {
    /// Configuration for a plain endpoint at `endpoint`
    pub fn insecure(endpoint: EndpointUri) -> Self {
        Self {
            endpoint,
            ..Default::default()
        }
    }

    /// Configuration for a secure endpoint validated against `trust_anchor_path`
    pub fn secure(endpoint: EndpointUri, trust_anchor_path: impl Into<PathBuf>) -> Self {
        Self {
            endpoint,
            trust_anchor_path: Some(trust_anchor_path.into()),
            ..Default::default()
        }
    }

    /// Configuration for tests: loopback peer and a short timeout
    pub fn testing() -> Self {
        Self {
            endpoint: EndpointUri::new(EndpointKind::Insecure, "127.0.0.1", COAP_DEFAULT_PORT),
            read_timeout_ms: 100,
            ..Default::default()
        }
    }

    /// Parse from a TOML document and validate
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "read_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.read_buffer_len < MAX_PDU_LEN {
            return Err(ConfigError::Invalid(format!(
                "read_buffer_len must be at least {MAX_PDU_LEN} bytes"
            )));
        }

        if self.endpoint.kind() == EndpointKind::Secure && self.trust_anchor_path.is_none() {
            return Err(ConfigError::Invalid(
                "trust_anchor_path is required for coaps:// endpoints".to_string(),
            ));
        }

        Ok(())
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Read the trust anchor file, if one is configured
    pub fn load_trust_anchor(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let Some(path) = &self.trust_anchor_path else {
            return Ok(None);
        };
        std::fs::read(path)
            .map(Some)
            .map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })
    }
}
