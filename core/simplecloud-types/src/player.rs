//! Online players and their staged updates.

use crate::ids::PlayerId;
use crate::value::{CacheValue, Updater, now_millis};
use serde::{Deserialize, Serialize};

/// Whether a player's switch to a server has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerServerConnectState {
    /// The proxy is moving the player to a server.
    Connecting,
    /// The player is on the server.
    Connected,
}

/// A player currently connected to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudPlayer {
    pub unique_id: PlayerId,
    pub name: String,
    pub display_name: String,
    /// Proxy service the player joined through.
    pub connected_proxy_name: Option<String>,
    /// Server service the player is on (or connecting to).
    pub connected_server_name: Option<String>,
    pub server_connect_state: PlayerServerConnectState,
    pub first_login: i64,
    pub last_login: i64,
    pub online_time_ms: i64,
}

impl CloudPlayer {
    /// Creates a freshly logged-in player on the given proxy.
    pub fn new(unique_id: PlayerId, name: impl Into<String>, proxy: impl Into<String>) -> Self {
        let name = name.into();
        let now = now_millis();
        Self {
            unique_id,
            display_name: name.clone(),
            name,
            connected_proxy_name: Some(proxy.into()),
            connected_server_name: None,
            server_connect_state: PlayerServerConnectState::Connecting,
            first_login: now,
            last_login: now,
            online_time_ms: 0,
        }
    }

    /// Starts staging changes against this player.
    #[must_use]
    pub fn updater(&self) -> CloudPlayerUpdater {
        CloudPlayerUpdater::new(self.clone())
    }
}

impl CacheValue for CloudPlayer {
    type Key = PlayerId;

    const TYPE_NAME: &'static str = "cloud-player";

    fn cache_key(&self) -> PlayerId {
        self.unique_id
    }
}

/// Staged changes to a [`CloudPlayer`].
#[derive(Debug, Clone)]
pub struct CloudPlayerUpdater {
    baseline: CloudPlayer,
    display_name: Option<String>,
    connected_proxy_name: Option<Option<String>>,
    connected_server_name: Option<Option<String>>,
    server_connect_state: Option<PlayerServerConnectState>,
    online_time_ms: Option<i64>,
}

impl CloudPlayerUpdater {
    pub fn new(baseline: CloudPlayer) -> Self {
        Self {
            baseline,
            display_name: None,
            connected_proxy_name: None,
            connected_server_name: None,
            server_connect_state: None,
            online_time_ms: None,
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn connected_proxy(mut self, proxy: Option<String>) -> Self {
        self.connected_proxy_name = Some(proxy);
        self
    }

    /// Moves the player to `server`, resetting the state to connecting.
    pub fn connect_to(mut self, server: impl Into<String>) -> Self {
        self.connected_server_name = Some(Some(server.into()));
        self.server_connect_state = Some(PlayerServerConnectState::Connecting);
        self
    }

    pub fn connected_server(mut self, server: Option<String>) -> Self {
        self.connected_server_name = Some(server);
        self
    }

    pub fn server_connect_state(mut self, state: PlayerServerConnectState) -> Self {
        self.server_connect_state = Some(state);
        self
    }

    pub fn online_time(mut self, millis: i64) -> Self {
        self.online_time_ms = Some(millis);
        self
    }

    /// The connected server after merge.
    pub fn connected_server_name(&self) -> Option<&str> {
        match &self.connected_server_name {
            Some(staged) => staged.as_deref(),
            None => self.baseline.connected_server_name.as_deref(),
        }
    }
}

impl Updater for CloudPlayerUpdater {
    type Value = CloudPlayer;

    fn baseline(&self) -> &CloudPlayer {
        &self.baseline
    }

    fn merge(&self) -> CloudPlayer {
        let base = &self.baseline;
        CloudPlayer {
            unique_id: base.unique_id,
            name: base.name.clone(),
            display_name: self
                .display_name
                .clone()
                .unwrap_or_else(|| base.display_name.clone()),
            connected_proxy_name: self
                .connected_proxy_name
                .clone()
                .unwrap_or_else(|| base.connected_proxy_name.clone()),
            connected_server_name: self
                .connected_server_name
                .clone()
                .unwrap_or_else(|| base.connected_server_name.clone()),
            server_connect_state: self
                .server_connect_state
                .unwrap_or(base.server_connect_state),
            first_login: base.first_login,
            last_login: base.last_login,
            online_time_ms: self.online_time_ms.unwrap_or(base.online_time_ms),
        }
    }

    fn has_changes(&self) -> bool {
        self.display_name.is_some()
            || self.connected_proxy_name.is_some()
            || self.connected_server_name.is_some()
            || self.server_connect_state.is_some()
            || self.online_time_ms.is_some()
    }
}
