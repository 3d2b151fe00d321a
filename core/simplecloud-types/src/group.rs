//! Service groups: the blueprints services are started from.

use crate::ids::NameKey;
use crate::value::{CacheValue, Updater};
use serde::{Deserialize, Serialize};

/// What kind of services a group starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceGroupType {
    Proxy,
    Lobby,
    Server,
}

/// A service group definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    pub name: String,
    pub group_type: ServiceGroupType,
    pub template_name: String,
    pub max_memory_mb: u32,
    pub min_online_count: u32,
    /// `None` means unlimited.
    pub max_online_count: Option<u32>,
    pub max_players: u32,
    pub maintenance: bool,
    pub static_group: bool,
    /// Lobby selection priority. Only meaningful for lobby groups.
    #[serde(default)]
    pub priority: i32,
    /// First port handed out to services. Only meaningful for proxy groups.
    #[serde(default)]
    pub start_port: Option<u16>,
    #[serde(default)]
    pub permission: Option<String>,
}

impl ServiceGroup {
    /// Creates a group with the defaults used by the setup wizard.
    pub fn new(name: impl Into<String>, group_type: ServiceGroupType) -> Self {
        let name = name.into();
        Self {
            template_name: name.clone(),
            name,
            group_type,
            max_memory_mb: 1024,
            min_online_count: 1,
            max_online_count: None,
            max_players: 20,
            maintenance: false,
            static_group: false,
            priority: 0,
            start_port: match group_type {
                ServiceGroupType::Proxy => Some(25565),
                _ => None,
            },
            permission: None,
        }
    }

    #[must_use]
    pub fn updater(&self) -> ServiceGroupUpdater {
        ServiceGroupUpdater::new(self.clone())
    }
}

impl CacheValue for ServiceGroup {
    type Key = NameKey;

    const TYPE_NAME: &'static str = "service-group";

    fn cache_key(&self) -> NameKey {
        NameKey::new(&self.name)
    }
}

/// Staged changes to a [`ServiceGroup`].
#[derive(Debug, Clone)]
pub struct ServiceGroupUpdater {
    baseline: ServiceGroup,
    template_name: Option<String>,
    max_memory_mb: Option<u32>,
    min_online_count: Option<u32>,
    max_online_count: Option<Option<u32>>,
    max_players: Option<u32>,
    maintenance: Option<bool>,
    priority: Option<i32>,
    permission: Option<Option<String>>,
}

impl ServiceGroupUpdater {
    pub fn new(baseline: ServiceGroup) -> Self {
        Self {
            baseline,
            template_name: None,
            max_memory_mb: None,
            min_online_count: None,
            max_online_count: None,
            max_players: None,
            maintenance: None,
            priority: None,
            permission: None,
        }
    }

    pub fn template_name(mut self, template: impl Into<String>) -> Self {
        self.template_name = Some(template.into());
        self
    }

    pub fn max_memory(mut self, mb: u32) -> Self {
        self.max_memory_mb = Some(mb);
        self
    }

    pub fn min_online_count(mut self, count: u32) -> Self {
        self.min_online_count = Some(count);
        self
    }

    pub fn max_online_count(mut self, count: Option<u32>) -> Self {
        self.max_online_count = Some(count);
        self
    }

    pub fn max_players(mut self, players: u32) -> Self {
        self.max_players = Some(players);
        self
    }

    pub fn maintenance(mut self, maintenance: bool) -> Self {
        self.maintenance = Some(maintenance);
        self
    }

    /// Ignored on merge unless the group is a lobby group.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn permission(mut self, permission: Option<String>) -> Self {
        self.permission = Some(permission);
        self
    }
}

impl Updater for ServiceGroupUpdater {
    type Value = ServiceGroup;

    fn baseline(&self) -> &ServiceGroup {
        &self.baseline
    }

    fn merge(&self) -> ServiceGroup {
        let base = &self.baseline;
        let priority = match base.group_type {
            ServiceGroupType::Lobby => self.priority.unwrap_or(base.priority),
            _ => base.priority,
        };
        ServiceGroup {
            name: base.name.clone(),
            group_type: base.group_type,
            template_name: self
                .template_name
                .clone()
                .unwrap_or_else(|| base.template_name.clone()),
            max_memory_mb: self.max_memory_mb.unwrap_or(base.max_memory_mb),
            min_online_count: self.min_online_count.unwrap_or(base.min_online_count),
            max_online_count: self.max_online_count.unwrap_or(base.max_online_count),
            max_players: self.max_players.unwrap_or(base.max_players),
            maintenance: self.maintenance.unwrap_or(base.maintenance),
            static_group: base.static_group,
            priority,
            start_port: base.start_port,
            permission: self
                .permission
                .clone()
                .unwrap_or_else(|| base.permission.clone()),
        }
    }

    fn has_changes(&self) -> bool {
        self.template_name.is_some()
            || self.max_memory_mb.is_some()
            || self.min_online_count.is_some()
            || self.max_online_count.is_some()
            || self.max_players.is_some()
            || self.maintenance.is_some()
            || self.priority.is_some()
            || self.permission.is_some()
    }
}
