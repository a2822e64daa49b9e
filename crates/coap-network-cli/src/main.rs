// Command line probe for CoAP endpoints

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands {
    pub mod check_config;
    pub mod probe;
}

#[derive(Parser)]
#[command(name = "coapnet")]
#[command(about = "Probe CoAP endpoints over UDP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one datagram to an endpoint and print the reply
    Probe {
        /// Endpoint URI (coap://host:port, coaps://host:port or host[:port])
        uri: Option<String>,

        /// Payload to send, hex encoded (default is an empty confirmable ping)
        #[arg(short, long, default_value = "40000001")]
        payload_hex: String,

        /// Read timeout in milliseconds, overrides the config file
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Config file to take the endpoint and timeouts from
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// PEM trust anchor for coaps endpoints
        #[arg(long)]
        trust_anchor: Option<PathBuf>,
    },

    /// Parse and validate an endpoint config file
    CheckConfig {
        /// Config file path
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe {
            uri,
            payload_hex,
            timeout_ms,
            config,
            trust_anchor,
        } => {
            let options = commands::probe::ProbeOptions {
                uri,
                payload_hex,
                timeout_ms,
                config,
                trust_anchor,
            };
            commands::probe::run(&options)?;
        }
        Commands::CheckConfig { config } => {
            commands::check_config::run(&config)?;
        }
    }

    Ok(())
}
