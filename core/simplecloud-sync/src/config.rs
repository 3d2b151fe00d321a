//! Sync configuration.

use crate::events::DEFAULT_EVENT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which cloud component a node runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// The central manager. Owns the player list, so it never spreads player
    /// updates itself.
    #[default]
    Manager,
    Wrapper,
    Service,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manager => write!(f, "manager"),
            Self::Wrapper => write!(f, "wrapper"),
            Self::Service => write!(f, "service"),
        }
    }
}

impl FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(Self::Manager),
            "wrapper" => Ok(Self::Wrapper),
            "service" => Ok(Self::Service),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Configuration for the sync layer of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Component name announced in the handshake.
    pub node_name: String,
    pub role: NodeRole,
    /// Upper bound for one broadcast round (milliseconds).
    pub broadcast_timeout_ms: u64,
    /// Timeout for a single request to a peer (milliseconds).
    pub request_timeout_ms: u64,
    /// Buffered events per subscriber.
    pub event_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            node_name: "Manager".to_string(),
            role: NodeRole::Manager,
            broadcast_timeout_ms: 5_000,
            request_timeout_ms: 3_000,
            event_channel_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SyncConfig {
    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
