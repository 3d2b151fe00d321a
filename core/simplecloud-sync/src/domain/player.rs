use crate::cache_list::{CacheList, CacheListConfig, ManagedCacheList};
use crate::events::EventBus;
use crate::executor::UpdateExecutor;
use crate::transport::PeerBroadcaster;
use simplecloud_types::{CloudEvent, CloudPlayer, PlayerId, PlayerServerConnectState};
use std::sync::Arc;

pub const PLAYER_CACHE: &str = "player-cache";

/// Event rules for players.
#[derive(Debug, Default)]
pub struct CloudPlayerExecutor;

impl UpdateExecutor<CloudPlayer> for CloudPlayerExecutor {
    fn identification_name(&self) -> &str {
        PLAYER_CACHE
    }

    fn determine_events(&self, update: &CloudPlayer, cached: Option<&CloudPlayer>) -> Vec<CloudEvent> {
        let Some(cached) = cached else {
            return vec![CloudEvent::PlayerRegistered {
                player: update.clone(),
            }];
        };

        let mut events = vec![CloudEvent::PlayerUpdated {
            player: update.clone(),
        }];
        let Some(server) = &update.connected_server_name else {
            return events;
        };
        if cached.connected_server_name.as_ref() != Some(server) {
            events.push(CloudEvent::PlayerServerConnect {
                player: update.clone(),
                old_server: cached.connected_server_name.clone(),
                new_server: server.clone(),
            });
        }
        if cached.server_connect_state == PlayerServerConnectState::Connecting
            && update.server_connect_state == PlayerServerConnectState::Connected
        {
            events.push(CloudEvent::PlayerServerConnected {
                player: update.clone(),
                server: server.clone(),
            });
        }
        events
    }

    fn removal_events(&self, cached: &CloudPlayer) -> Vec<CloudEvent> {
        vec![CloudEvent::PlayerUnregistered {
            player: cached.clone(),
        }]
    }
}

/// Online players.
pub struct CloudPlayerManager {
    list: CacheList<CloudPlayer>,
}

impl CloudPlayerManager {
    pub fn new(
        events: EventBus,
        broadcaster: Arc<dyn PeerBroadcaster>,
        config: CacheListConfig,
    ) -> Self {
        Self {
            list: CacheList::new(Arc::new(CloudPlayerExecutor), events, broadcaster, config),
        }
    }

    pub fn get_by_id(&self, id: PlayerId) -> Option<Arc<CloudPlayer>> {
        self.list.get(&id)
    }

    /// Looks up a player by name, ignoring case.
    pub fn get_by_name(&self, name: &str) -> Option<CloudPlayer> {
        self.list.find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Players currently connected to (or connecting to) `server`.
    pub fn players_on_server(&self, server: &str) -> Vec<CloudPlayer> {
        self.list.filter(|p| {
            p.connected_server_name
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(server))
        })
    }

    pub fn online_count(&self) -> usize {
        self.list.len()
    }
}

impl ManagedCacheList for CloudPlayerManager {
    type Value = CloudPlayer;

    fn list(&self) -> &CacheList<CloudPlayer> {
        &self.list
    }
}
