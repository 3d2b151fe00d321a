//! Everything one node needs to take part in cache-list sync.

use crate::cache_list::CacheListConfig;
use crate::config::{NodeRole, SyncConfig};
use crate::domain::{
    CloudPlayerManager, CloudServiceManager, ServiceGroupManager, TemplateManager, WrapperManager,
};
use crate::error::SyncResult;
use crate::events::{EventBus, EventEnvelope};
use crate::handler::PacketHandler;
use crate::persistence::PersistenceHook;
use crate::registry::CacheListManager;
use crate::transport::{NoopBroadcaster, PeerBroadcaster};
use crate::value_types::ValueTypeRegistry;
use simplecloud_types::{CloudPlayer, CloudService, ServiceGroup, Template, Wrapper};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// The managers, registries and event bus of one node.
pub struct CloudContext {
    config: SyncConfig,
    events: EventBus,
    broadcaster: Arc<dyn PeerBroadcaster>,
    lists: Arc<CacheListManager>,
    types: Arc<ValueTypeRegistry>,
    players: Arc<CloudPlayerManager>,
    groups: Arc<ServiceGroupManager>,
    templates: Arc<TemplateManager>,
    wrappers: Arc<WrapperManager>,
    services: Arc<CloudServiceManager>,
}

impl CloudContext {
    pub fn builder(config: SyncConfig) -> CloudContextBuilder {
        CloudContextBuilder {
            config,
            broadcaster: None,
            group_store: None,
            template_store: None,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to all events derived on this node.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    pub fn broadcaster(&self) -> &Arc<dyn PeerBroadcaster> {
        &self.broadcaster
    }

    pub fn lists(&self) -> &Arc<CacheListManager> {
        &self.lists
    }

    pub fn value_types(&self) -> &Arc<ValueTypeRegistry> {
        &self.types
    }

    pub fn players(&self) -> &Arc<CloudPlayerManager> {
        &self.players
    }

    pub fn groups(&self) -> &Arc<ServiceGroupManager> {
        &self.groups
    }

    pub fn templates(&self) -> &Arc<TemplateManager> {
        &self.templates
    }

    pub fn wrappers(&self) -> &Arc<WrapperManager> {
        &self.wrappers
    }

    pub fn services(&self) -> &Arc<CloudServiceManager> {
        &self.services
    }

    /// A handler applying received packets to this node's lists.
    pub fn handler(&self) -> PacketHandler {
        PacketHandler::new(
            &self.config.node_name,
            Arc::clone(&self.lists),
            Arc::clone(&self.types),
        )
    }
}

/// Builder for [`CloudContext`].
pub struct CloudContextBuilder {
    config: SyncConfig,
    broadcaster: Option<Arc<dyn PeerBroadcaster>>,
    group_store: Option<Arc<dyn PersistenceHook<ServiceGroup>>>,
    template_store: Option<Arc<dyn PersistenceHook<Template>>>,
}

impl CloudContextBuilder {
    /// Where local changes are sent. Defaults to [`NoopBroadcaster`].
    pub fn broadcaster(mut self, broadcaster: Arc<dyn PeerBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn group_store(mut self, store: Arc<dyn PersistenceHook<ServiceGroup>>) -> Self {
        self.group_store = Some(store);
        self
    }

    pub fn template_store(mut self, store: Arc<dyn PersistenceHook<Template>>) -> Self {
        self.template_store = Some(store);
        self
    }

    /// Creates the five managers and registers their lists.
    pub fn build(self) -> SyncResult<CloudContext> {
        let config = self.config;
        let events = EventBus::new(config.event_channel_capacity);
        let broadcaster = self
            .broadcaster
            .unwrap_or_else(|| Arc::new(NoopBroadcaster));

        let list_config = CacheListConfig {
            spread_updates: true,
            broadcast_timeout: config.broadcast_timeout(),
        };
        let player_config = CacheListConfig {
            spread_updates: config.role != NodeRole::Manager,
            ..list_config
        };

        let mut types = ValueTypeRegistry::new();
        types
            .register::<CloudPlayer>()
            .register::<ServiceGroup>()
            .register::<Template>()
            .register::<Wrapper>()
            .register::<CloudService>();

        let services = Arc::new(CloudServiceManager::new(
            events.clone(),
            Arc::clone(&broadcaster),
            list_config,
        ));
        let players = Arc::new(CloudPlayerManager::new(
            events.clone(),
            Arc::clone(&broadcaster),
            player_config,
        ));
        let mut groups = ServiceGroupManager::new(
            events.clone(),
            Arc::clone(&broadcaster),
            list_config,
            Arc::clone(&services),
        );
        if let Some(store) = self.group_store {
            groups = groups.with_store(store);
        }
        let groups = Arc::new(groups);
        let mut templates = TemplateManager::new(events.clone(), Arc::clone(&broadcaster), list_config);
        if let Some(store) = self.template_store {
            templates = templates.with_store(store);
        }
        let templates = Arc::new(templates);
        let wrappers = Arc::new(WrapperManager::new(
            events.clone(),
            Arc::clone(&broadcaster),
            list_config,
        ));

        let lists = Arc::new(CacheListManager::new());
        lists.register_cache_list(players.clone())?;
        lists.register_cache_list(groups.clone())?;
        lists.register_cache_list(templates.clone())?;
        lists.register_cache_list(wrappers.clone())?;
        lists.register_cache_list(services.clone())?;

        info!(
            "Cloud context ready for {} ({}) with {} list(s)",
            config.node_name,
            config.role,
            lists.len()
        );

        Ok(CloudContext {
            config,
            events,
            broadcaster,
            lists,
            types: Arc::new(types),
            players,
            groups,
            templates,
            wrappers,
            services,
        })
    }
}
