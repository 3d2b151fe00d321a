//! SimpleCloud node binary.
//!
//! Runs a manager or wrapper that keeps its cache lists in sync with the
//! configured peers.
//!
//! Usage:
//!   simplecloud-node --role manager --listen 0.0.0.0:1630 --data-dir storage
//!   simplecloud-node --role wrapper --name Wrapper-1 --peer 10.0.0.1:1630

use anyhow::Result;
use clap::Parser;
use simplecloud_node::{Node, NodeConfig, Overrides};
use simplecloud_sync::NodeRole;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "simplecloud-node")]
#[command(about = "SimpleCloud node running the cache-list sync")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Component name announced to peers
    #[arg(short, long)]
    name: Option<String>,

    /// Role of this node (manager, wrapper, service)
    #[arg(short, long)]
    role: Option<NodeRole>,

    /// Address to accept peers on
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Peer to connect to (repeatable)
    #[arg(short, long = "peer")]
    peers: Vec<SocketAddr>,

    /// Directory for stored groups and templates (manager only)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    config.apply(Overrides {
        node_name: args.name,
        role: args.role,
        listen: args.listen,
        peers: args.peers,
        data_dir: args.data_dir,
    });

    info!(
        "SimpleCloud node {} starting as {}...",
        config.sync.node_name, config.sync.role
    );
    let node = Node::start(config).await?;
    if let Some(addr) = node.listen_addr() {
        info!("Listening on {}", addr);
    }

    let mut events = node.context().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(envelope) => debug!(
                    "{} ({}, from_packet={})",
                    envelope.event.name(),
                    envelope.list_name,
                    envelope.from_packet
                ),
                Err(RecvError::Lagged(skipped)) => warn!("Event log skipped {} event(s)", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    node.shutdown();
    Ok(())
}

fn init_logging(verbose: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .compact()
            .init();
        return;
    }
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();
}
