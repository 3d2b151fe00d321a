//! Domain events derived from cache list changes.
//!
//! Events are never sent over the wire by the cache lists themselves: every
//! node derives them locally from the difference between the incoming value
//! and its own cached copy.

use crate::group::ServiceGroup;
use crate::player::CloudPlayer;
use crate::service::{CloudService, ServiceState};
use crate::template::Template;
use crate::wrapper::Wrapper;
use serde::{Deserialize, Serialize};

/// A domain event fired after a cache list applied a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum CloudEvent {
    // ── Players ─────────────────────────────────────────────────
    PlayerRegistered {
        player: CloudPlayer,
    },
    PlayerUpdated {
        player: CloudPlayer,
    },
    /// The player started switching to another server.
    PlayerServerConnect {
        player: CloudPlayer,
        old_server: Option<String>,
        new_server: String,
    },
    /// The switch started by `PlayerServerConnect` completed.
    PlayerServerConnected {
        player: CloudPlayer,
        server: String,
    },
    PlayerUnregistered {
        player: CloudPlayer,
    },

    // ── Service groups ──────────────────────────────────────────
    GroupCreated {
        group: ServiceGroup,
    },
    GroupUpdated {
        group: ServiceGroup,
    },
    GroupDeleted {
        group: ServiceGroup,
    },

    // ── Templates ───────────────────────────────────────────────
    TemplateCreated {
        template: Template,
    },
    TemplateUpdated {
        template: Template,
    },
    TemplateDeleted {
        template: Template,
    },

    // ── Wrappers ────────────────────────────────────────────────
    WrapperRegistered {
        wrapper: Wrapper,
    },
    WrapperUpdated {
        wrapper: Wrapper,
    },
    WrapperUnregistered {
        wrapper: Wrapper,
    },

    // ── Services ────────────────────────────────────────────────
    ServiceRegistered {
        service: CloudService,
    },
    ServiceUpdated {
        service: CloudService,
    },
    ServiceStateChanged {
        service: CloudService,
        from: ServiceState,
        to: ServiceState,
    },
    /// The service's plugin connected back to the manager.
    ServiceConnected {
        service: CloudService,
    },
    ServiceUnregistered {
        service: CloudService,
    },
}

impl CloudEvent {
    /// Stable name for logs and filtering.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerRegistered { .. } => "player-registered",
            Self::PlayerUpdated { .. } => "player-updated",
            Self::PlayerServerConnect { .. } => "player-server-connect",
            Self::PlayerServerConnected { .. } => "player-server-connected",
            Self::PlayerUnregistered { .. } => "player-unregistered",
            Self::GroupCreated { .. } => "group-created",
            Self::GroupUpdated { .. } => "group-updated",
            Self::GroupDeleted { .. } => "group-deleted",
            Self::TemplateCreated { .. } => "template-created",
            Self::TemplateUpdated { .. } => "template-updated",
            Self::TemplateDeleted { .. } => "template-deleted",
            Self::WrapperRegistered { .. } => "wrapper-registered",
            Self::WrapperUpdated { .. } => "wrapper-updated",
            Self::WrapperUnregistered { .. } => "wrapper-unregistered",
            Self::ServiceRegistered { .. } => "service-registered",
            Self::ServiceUpdated { .. } => "service-updated",
            Self::ServiceStateChanged { .. } => "service-state-changed",
            Self::ServiceConnected { .. } => "service-connected",
            Self::ServiceUnregistered { .. } => "service-unregistered",
        }
    }

    /// True for events announcing a value that was not cached before.
    #[must_use]
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            Self::PlayerRegistered { .. }
                | Self::GroupCreated { .. }
                | Self::TemplateCreated { .. }
                | Self::WrapperRegistered { .. }
                | Self::ServiceRegistered { .. }
        )
    }

    /// True for events announcing a removed value.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::PlayerUnregistered { .. }
                | Self::GroupDeleted { .. }
                | Self::TemplateDeleted { .. }
                | Self::WrapperUnregistered { .. }
                | Self::ServiceUnregistered { .. }
        )
    }
}
