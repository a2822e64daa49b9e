//! Endpoint URI parsing
//!
//! Accepts `coap://host[:port]`, `coaps://host[:port]` and bare
//! `host[:port]`. The scheme picks the endpoint kind and the default port;
//! any path or query is ignored since resource addressing belongs to the
//! protocol layer above. IPv6 hosts are written in brackets
//! (`coap://[::1]:5683`), though a bare IPv6 literal without a port is
//! accepted too.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointKind, EndpointParams};
use crate::error::{NetworkError, NetworkResult};

/// Default port for plain CoAP
pub const COAP_DEFAULT_PORT: u16 = 5683;

/// Default port for CoAP over a secure session
pub const COAPS_DEFAULT_PORT: u16 = 5684;

/// A parsed peer address together with the transport kind it asks for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointUri {
    kind: EndpointKind,
    host: String,
    port: u16,
}

impl EndpointUri {
    /// Build from parts
    pub fn new(kind: EndpointKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
        }
    }

    /// Parse a `coap://`, `coaps://` or bare `host[:port]` string
    pub fn parse(uri: &str) -> NetworkResult<Self> {
        let uri = uri.trim();
        let (kind, rest) = match uri.split_once("://") {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("coap") => {
                (EndpointKind::Insecure, rest)
            }
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("coaps") => {
                (EndpointKind::Secure, rest)
            }
            Some((scheme, _)) => {
                return Err(NetworkError::invalid_parameter(format!(
                    "unsupported scheme '{scheme}'"
                )))
            }
            None => (EndpointKind::Insecure, uri),
        };

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let (host, port) = split_authority(authority)?;

        if host.is_empty() {
            return Err(NetworkError::invalid_parameter(format!(
                "no host in '{uri}'"
            )));
        }

        let port = match port {
            Some(port) => port,
            None => default_port(kind),
        };
        Ok(Self::new(kind, host, port))
    }

    /// Transport kind selected by the scheme
    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// Host without brackets
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Peer port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Check if the host appears to be an IPv6 literal
    pub fn is_ipv6(&self) -> bool {
        self.host.contains(':')
    }

    /// Init parameters for this address
    pub fn params<'a>(&'a self, trust_anchor: Option<&'a [u8]>) -> EndpointParams<'a> {
        EndpointParams {
            kind: self.kind,
            host: &self.host,
            port: self.port,
            trust_anchor,
        }
    }
}

fn default_port(kind: EndpointKind) -> u16 {
    match kind {
        EndpointKind::Insecure => COAP_DEFAULT_PORT,
        EndpointKind::Secure => COAPS_DEFAULT_PORT,
    }
}

/// Split "host", "host:port", "[ipv6]" or "[ipv6]:port"
fn split_authority(authority: &str) -> NetworkResult<(&str, Option<u16>)> {
    if let Some(bracketed) = authority.strip_prefix('[') {
        let Some((host, tail)) = bracketed.split_once(']') else {
            return Err(NetworkError::invalid_parameter(format!(
                "unterminated IPv6 literal in '{authority}'"
            )));
        };
        return match tail {
            "" => Ok((host, None)),
            _ => match tail.strip_prefix(':') {
                Some(port) => Ok((host, Some(parse_port(port)?))),
                None => Err(NetworkError::invalid_parameter(format!(
                    "unexpected '{tail}' after IPv6 literal"
                ))),
            },
        };
    }

    match authority.rfind(':') {
        // More than one colon without brackets: an IPv6 literal with no port
        Some(colon) if authority[..colon].contains(':') => Ok((authority, None)),
        Some(colon) => Ok((
            &authority[..colon],
            Some(parse_port(&authority[colon + 1..])?),
        )),
        None => Ok((authority, None)),
    }
}

fn parse_port(port: &str) -> NetworkResult<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(NetworkError::invalid_parameter(format!(
            "invalid port '{port}'"
        ))),
        Ok(port) => Ok(port),
    }
}

impl FromStr for EndpointUri {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EndpointUri {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EndpointUri> for String {
    fn from(value: EndpointUri) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for EndpointUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.kind {
            EndpointKind::Insecure => "coap",
            EndpointKind::Secure => "coaps",
        };
        if self.is_ipv6() {
            write!(f, "{scheme}://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{scheme}://{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> EndpointUri {
        EndpointUri::parse(uri).unwrap_or_else(|e| panic!("{uri}: {e}"))
    }

    #[test]
    fn test_scheme_selects_kind_and_default_port() {
        let plain = parse("coap://coap.me");
        assert_eq!(plain.kind(), EndpointKind::Insecure);
        assert_eq!(plain.port(), COAP_DEFAULT_PORT);

        let secure = parse("coaps://coap.me");
        assert_eq!(secure.kind(), EndpointKind::Secure);
        assert_eq!(secure.port(), COAPS_DEFAULT_PORT);

        let bare = parse("192.168.1.10:7000");
        assert_eq!(bare.kind(), EndpointKind::Insecure);
        assert_eq!(bare.host(), "192.168.1.10");
        assert_eq!(bare.port(), 7000);
    }

    #[test]
    fn test_path_and_query_are_ignored() {
        let uri = parse("coap://sensor.local:6000/.well-known/core?rt=temp");
        assert_eq!(uri.host(), "sensor.local");
        assert_eq!(uri.port(), 6000);
    }

    #[test]
    fn test_ipv6_hosts() {
        let uri = parse("coaps://[fe80::1]:9000");
        assert_eq!(uri.host(), "fe80::1");
        assert_eq!(uri.port(), 9000);
        assert!(uri.is_ipv6());
        assert_eq!(uri.to_string(), "coaps://[fe80::1]:9000");

        let no_port = parse("coap://[::1]");
        assert_eq!(no_port.port(), COAP_DEFAULT_PORT);

        let bare = parse("::1");
        assert_eq!(bare.host(), "::1");
        assert_eq!(bare.port(), COAP_DEFAULT_PORT);
    }

    #[test]
    fn test_rejects_malformed_input() {
        for bad in [
            "http://example.com",
            "coap://",
            "coap://:5683",
            "coap://host:0",
            "coap://host:70000",
            "coap://host:abc",
            "coap://[::1",
            "coap://[::1]x",
        ] {
            let err = EndpointUri::parse(bad).expect_err(bad);
            assert!(
                matches!(err, NetworkError::InvalidParameter { .. }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_params_borrow_host() {
        let uri = parse("coaps://gateway:5684");
        let params = uri.params(Some(b"pem"));
        assert_eq!(params.kind, EndpointKind::Secure);
        assert_eq!(params.host, "gateway");
        assert_eq!(params.port, 5684);
        assert_eq!(params.trust_anchor, Some(&b"pem"[..]));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let uri = parse("coap://coap.me:5683");
        assert_eq!(uri.to_string(), "coap://coap.me:5683");
        assert_eq!(parse(&uri.to_string()), uri);
    }
}
