// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::net::IpAddr;

use clap::Parser;
use nostr_relayd::{Relay, RelayBuilder, RelayInformationDocument};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nostr-relayd", about = "Minimal Nostr relay daemon", version)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Relay name exposed in the NIP-11 document
    #[arg(long, default_value = "nostr-relayd")]
    name: String,
    /// Relay description
    #[arg(long, default_value = "A minimal nostr relay")]
    description: String,
    /// Relay operator public key (hex)
    #[arg(long)]
    pubkey: Option<String>,
    /// Relay operator contact
    #[arg(long)]
    contact: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Args = Args::parse();

    let mut info: RelayInformationDocument = RelayInformationDocument::new();
    info.name = Some(args.name);
    info.description = Some(args.description);
    info.pubkey = args.pubkey;
    info.contact = args.contact;

    let builder: RelayBuilder = RelayBuilder::default()
        .addr(args.host)
        .port(args.port)
        .info(info);

    // A bind or storage-init failure propagates and exits nonzero
    let relay: Relay = Relay::run(builder).await?;

    tracing::info!("Relay listening at {}", relay.url());

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down.");
    relay.shutdown();

    Ok(())
}
