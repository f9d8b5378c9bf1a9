//! tcp-droplet-receiver: identity echo backend for TCP routing checks

use anyhow::Context;
use clap::Parser;
use tcp_routing_ats::{defaults, logging::Logger, models::Config, receiver::IdentityEchoServer};

/// Echo every chunk received, prefixed with this instance's server id
#[derive(Parser, Debug)]
#[command(name = "tcp-droplet-receiver")]
#[command(version, about, long_about = None)]
struct Args {
    /// Identity prepended to every echoed chunk
    #[arg(long = "serverId", alias = "server-id", env = "SERVER_ID", default_value = defaults::DEFAULT_BACKEND_ID)]
    server_id: String,

    /// Address to listen on
    #[arg(long, env = "RECEIVER_ADDRESS", default_value = defaults::DEFAULT_RECEIVER_ADDRESS)]
    address: String,

    /// Log every connection
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_config = Config {
        verbose: true,
        debug: args.verbose,
        ..Config::default()
    };
    let logger = Logger::with_config("RECEIVER".to_string(), &log_config);

    let server = IdentityEchoServer::bind(args.address.as_str(), args.server_id.as_str())
        .await
        .with_context(|| format!("failed to listen on {}", args.address))?
        .with_logger(logger);

    server.run().await.context("receiver stopped")?;
    Ok(())
}
