// One-shot request/reply probe against a CoAP endpoint

use anyhow::{bail, Context};
use coap_network::{
    EndpointUri, NetworkConfig, NetworkEndpoint, NoSecureTransport, UdpDatagramTransport,
};
use std::path::PathBuf;

/// Arguments collected from the `probe` subcommand
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    pub uri: Option<String>,
    pub payload_hex: String,
    pub timeout_ms: Option<u64>,
    pub config: Option<PathBuf>,
    pub trust_anchor: Option<PathBuf>,
}

/// Merge the config file (if any) with command line overrides
///
/// The URI argument wins over the file's endpoint, and at least one of the
/// two must be present.
pub fn resolve_config(options: &ProbeOptions) -> anyhow::Result<NetworkConfig> {
    let mut config = match &options.config {
        Some(path) => NetworkConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => match &options.uri {
            Some(_) => NetworkConfig::default(),
            None => bail!("probe needs an endpoint URI or a --config file"),
        },
    };

    if let Some(uri) = &options.uri {
        config.endpoint =
            EndpointUri::parse(uri).with_context(|| format!("invalid endpoint URI {uri:?}"))?;
    }
    if let Some(path) = &options.trust_anchor {
        config.trust_anchor_path = Some(path.clone());
    }
    if let Some(timeout_ms) = options.timeout_ms {
        config.read_timeout_ms = timeout_ms;
    }

    config.validate().context("invalid probe configuration")?;
    Ok(config)
}

/// Send the payload once and print whatever comes back before the timeout
pub fn run(options: &ProbeOptions) -> anyhow::Result<()> {
    let config = resolve_config(options)?;
    let payload = hex::decode(options.payload_hex.trim())
        .with_context(|| format!("payload is not valid hex: {:?}", options.payload_hex))?;
    let trust_anchor = config.load_trust_anchor()?;

    let params = config.endpoint.params(trust_anchor.as_deref());
    let mut endpoint =
        NetworkEndpoint::init(UdpDatagramTransport::new(), NoSecureTransport, Some(&params))
            .with_context(|| format!("failed to open endpoint {}", config.endpoint))?;

    tracing::debug!(endpoint = %config.endpoint, bytes = payload.len(), "sending probe");
    endpoint.write(&payload).context("probe write failed")?;

    let mut buffer = vec![0u8; config.read_buffer_len];
    let received = endpoint.read(&mut buffer, config.read_timeout());
    if received == 0 {
        println!(
            "no reply from {} within {}ms",
            config.endpoint, config.read_timeout_ms
        );
    } else {
        println!("{received} bytes from {}", config.endpoint);
        println!("{}", hex::encode(&buffer[..received]));
    }

    endpoint.deinit()?;
    Ok(())
}
