//! Running (or queued) services started from a group.

use crate::ids::NameKey;
use crate::value::{CacheValue, Updater};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    /// Queued on a wrapper, process not yet spawned.
    Prepared,
    Starting,
    /// Joinable and listed to players.
    Visible,
    /// Running but hidden from players (e.g. ingame).
    Invisible,
    Closed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prepared => "PREPARED",
            Self::Starting => "STARTING",
            Self::Visible => "VISIBLE",
            Self::Invisible => "INVISIBLE",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// A service instance of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudService {
    pub group_name: String,
    pub service_number: u32,
    pub wrapper_name: Option<String>,
    pub port: u16,
    pub state: ServiceState,
    pub online_count: u32,
    pub max_players: u32,
    pub used_memory_mb: u32,
    /// Whether the service's plugin has connected back to the manager.
    pub authenticated: bool,
}

impl CloudService {
    pub fn new(group_name: impl Into<String>, service_number: u32, port: u16) -> Self {
        Self {
            group_name: group_name.into(),
            service_number,
            wrapper_name: None,
            port,
            state: ServiceState::Prepared,
            online_count: 0,
            max_players: 20,
            used_memory_mb: 0,
            authenticated: false,
        }
    }

    /// The service name, `<group>-<number>`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}-{}", self.group_name, self.service_number)
    }

    #[must_use]
    pub fn updater(&self) -> CloudServiceUpdater {
        CloudServiceUpdater::new(self.clone())
    }
}

impl CacheValue for CloudService {
    type Key = NameKey;

    const TYPE_NAME: &'static str = "cloud-service";

    fn cache_key(&self) -> NameKey {
        NameKey::new(&self.name())
    }
}

/// Staged changes to a [`CloudService`].
#[derive(Debug, Clone)]
pub struct CloudServiceUpdater {
    baseline: CloudService,
    wrapper_name: Option<Option<String>>,
    state: Option<ServiceState>,
    online_count: Option<u32>,
    max_players: Option<u32>,
    used_memory_mb: Option<u32>,
    authenticated: Option<bool>,
}

impl CloudServiceUpdater {
    pub fn new(baseline: CloudService) -> Self {
        Self {
            baseline,
            wrapper_name: None,
            state: None,
            online_count: None,
            max_players: None,
            used_memory_mb: None,
            authenticated: None,
        }
    }

    pub fn wrapper(mut self, wrapper: Option<String>) -> Self {
        self.wrapper_name = Some(wrapper);
        self
    }

    pub fn state(mut self, state: ServiceState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn online_count(mut self, count: u32) -> Self {
        self.online_count = Some(count);
        self
    }

    pub fn max_players(mut self, players: u32) -> Self {
        self.max_players = Some(players);
        self
    }

    pub fn used_memory(mut self, mb: u32) -> Self {
        self.used_memory_mb = Some(mb);
        self
    }

    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = Some(authenticated);
        self
    }
}

impl Updater for CloudServiceUpdater {
    type Value = CloudService;

    fn baseline(&self) -> &CloudService {
        &self.baseline
    }

    fn merge(&self) -> CloudService {
        let base = &self.baseline;
        CloudService {
            group_name: base.group_name.clone(),
            service_number: base.service_number,
            wrapper_name: self
                .wrapper_name
                .clone()
                .unwrap_or_else(|| base.wrapper_name.clone()),
            port: base.port,
            state: self.state.unwrap_or(base.state),
            online_count: self.online_count.unwrap_or(base.online_count),
            max_players: self.max_players.unwrap_or(base.max_players),
            used_memory_mb: self.used_memory_mb.unwrap_or(base.used_memory_mb),
            authenticated: self.authenticated.unwrap_or(base.authenticated),
        }
    }

    fn has_changes(&self) -> bool {
        self.wrapper_name.is_some()
            || self.state.is_some()
            || self.online_count.is_some()
            || self.max_players.is_some()
            || self.used_memory_mb.is_some()
            || self.authenticated.is_some()
    }
}
