//! SimpleCloud node: configuration and startup wiring.
//!
//! A node is one cloud component (manager or wrapper) running the cache-list
//! sync over TCP. The binary in `main.rs` only parses arguments and sets up
//! logging; everything testable lives here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use simplecloud_sync::net::TcpTransport;
use simplecloud_sync::persistence::JsonDirectoryStore;
use simplecloud_sync::{CloudContext, ManagedCacheList, NodeRole, SyncConfig};
use simplecloud_types::{ServiceGroup, Template};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Node configuration, as read from a TOML file.
///
/// ```toml
/// listen = "0.0.0.0:1630"
/// peers = []
/// data_dir = "storage"
///
/// [sync]
/// node_name = "Manager"
/// role = "manager"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub sync: SyncConfig,
    /// Address to accept peers on. Wrappers usually only connect out.
    pub listen: Option<SocketAddr>,
    /// Nodes to connect to on startup.
    pub peers: Vec<SocketAddr>,
    /// Where the manager keeps groups and templates.
    pub data_dir: Option<PathBuf>,
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub node_name: Option<String>,
    pub role: Option<NodeRole>,
    pub listen: Option<SocketAddr>,
    pub peers: Vec<SocketAddr>,
    pub data_dir: Option<PathBuf>,
}

impl NodeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid node config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("in {}", path.display()))
    }

    /// Applies command line overrides. Peers given on the command line are
    /// added to the configured ones.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(name) = overrides.node_name {
            self.sync.node_name = name;
        }
        if let Some(role) = overrides.role {
            self.sync.role = role;
        }
        if overrides.listen.is_some() {
            self.listen = overrides.listen;
        }
        for peer in overrides.peers {
            if !self.peers.contains(&peer) {
                self.peers.push(peer);
            }
        }
        if overrides.data_dir.is_some() {
            self.data_dir = overrides.data_dir;
        }
    }
}

/// A running node.
pub struct Node {
    context: CloudContext,
    transport: Arc<TcpTransport>,
    listen_addr: Option<SocketAddr>,
}

impl Node {
    /// Builds the context, restores stored state, starts listening and
    /// connects to the configured peers.
    ///
    /// Unreachable peers are logged and skipped.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        let sync = config.sync.clone();
        let transport = TcpTransport::new(&sync.node_name, sync.request_timeout());
        let mut builder = CloudContext::builder(sync.clone()).broadcaster(transport.clone());

        let mut stored_groups = Vec::new();
        let mut stored_templates = Vec::new();
        if let Some(dir) = config.data_dir.as_ref().filter(|_| sync.role == NodeRole::Manager) {
            let groups = JsonDirectoryStore::<ServiceGroup>::open(dir.join("groups"))
                .await
                .context("failed to open group store")?;
            let templates = JsonDirectoryStore::<Template>::open(dir.join("templates"))
                .await
                .context("failed to open template store")?;
            stored_groups = groups.load_all().await?;
            stored_templates = templates.load_all().await?;
            builder = builder
                .group_store(Arc::new(groups))
                .template_store(Arc::new(templates));
        }

        let context = builder.build()?;
        transport.attach(context.handler())?;

        // Restored before any peer is connected, so nothing is broadcast.
        let restored = stored_groups.len() + stored_templates.len();
        for template in stored_templates {
            context.templates().list().update(template, false).await?;
        }
        for group in stored_groups {
            context.groups().list().update(group, false).await?;
        }
        if restored > 0 {
            info!("Restored {} stored object(s)", restored);
        }

        let listen_addr = match config.listen {
            Some(addr) => Some(
                transport
                    .listen(addr)
                    .await
                    .with_context(|| format!("failed to listen on {addr}"))?,
            ),
            None => None,
        };

        for peer in &config.peers {
            match transport.connect(*peer).await {
                Ok(name) => info!("Joined {} at {}", name, peer),
                Err(e) => warn!("Could not connect to {}: {}", peer, e),
            }
        }

        Ok(Self {
            context,
            transport,
            listen_addr,
        })
    }

    pub fn context(&self) -> &CloudContext {
        &self.context
    }

    pub fn transport(&self) -> &Arc<TcpTransport> {
        &self.transport
    }

    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen_addr
    }

    pub fn shutdown(&self) {
        self.transport.shutdown();
    }
}
