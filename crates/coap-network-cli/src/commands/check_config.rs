// Config file validation

use anyhow::Context;
use coap_network::NetworkConfig;
use std::path::Path;

/// Load, validate and echo an endpoint config file
pub fn run(path: &Path) -> anyhow::Result<()> {
    // `load` parses and validates in one step.
    let config = NetworkConfig::load(path)
        .with_context(|| format!("{} is not a usable endpoint config", path.display()))?;

    if let Some(anchor) = config.load_trust_anchor()? {
        tracing::debug!(bytes = anchor.len(), "trust anchor readable");
    }

    println!("{} OK", path.display());
    print!("{}", config.to_toml_string()?);
    Ok(())
}
