//! Shared state types for SimpleCloud.
//!
//! This crate defines the values replicated between the manager, wrappers
//! and services:
//! - Player and name identifiers
//! - Players, service groups, templates, wrappers and services
//! - Updaters: staged changes merged against a baseline value
//! - Domain events derived from cache list changes
//!
//! Replication itself lives in `simplecloud-sync`.

mod event;
mod group;
mod ids;
mod player;
mod service;
mod template;
mod value;
mod wrapper;

pub use event::CloudEvent;
pub use group::{ServiceGroup, ServiceGroupType, ServiceGroupUpdater};
pub use ids::{NameKey, PlayerId};
pub use player::{CloudPlayer, CloudPlayerUpdater, PlayerServerConnectState};
pub use service::{CloudService, CloudServiceUpdater, ServiceState};
pub use template::{Template, TemplateUpdater};
pub use value::{CacheValue, Updater, now_millis};
pub use wrapper::{Wrapper, WrapperUpdater};
