//! Wrappers: the machines services run on.

use crate::ids::NameKey;
use crate::value::{CacheValue, Updater};
use serde::{Deserialize, Serialize};

/// A wrapper registered with the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub name: String,
    pub host: String,
    pub max_memory_mb: u32,
    pub used_memory_mb: u32,
    pub max_simultaneously_starting_services: u32,
    /// Whether the wrapper has completed its handshake with the manager.
    pub authenticated: bool,
    /// Whether all templates have been copied to the wrapper.
    pub templates_ready: bool,
}

impl Wrapper {
    pub fn new(name: impl Into<String>, host: impl Into<String>, max_memory_mb: u32) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            max_memory_mb,
            used_memory_mb: 0,
            max_simultaneously_starting_services: 2,
            authenticated: false,
            templates_ready: false,
        }
    }

    /// Memory still available for new services.
    #[must_use]
    pub fn free_memory_mb(&self) -> u32 {
        self.max_memory_mb.saturating_sub(self.used_memory_mb)
    }

    #[must_use]
    pub fn updater(&self) -> WrapperUpdater {
        WrapperUpdater::new(self.clone())
    }
}

impl CacheValue for Wrapper {
    type Key = NameKey;

    const TYPE_NAME: &'static str = "wrapper";

    fn cache_key(&self) -> NameKey {
        NameKey::new(&self.name)
    }
}

/// Staged changes to a [`Wrapper`].
#[derive(Debug, Clone)]
pub struct WrapperUpdater {
    baseline: Wrapper,
    max_memory_mb: Option<u32>,
    used_memory_mb: Option<u32>,
    max_simultaneously_starting_services: Option<u32>,
    authenticated: Option<bool>,
    templates_ready: Option<bool>,
}

impl WrapperUpdater {
    pub fn new(baseline: Wrapper) -> Self {
        Self {
            baseline,
            max_memory_mb: None,
            used_memory_mb: None,
            max_simultaneously_starting_services: None,
            authenticated: None,
            templates_ready: None,
        }
    }

    pub fn max_memory(mut self, mb: u32) -> Self {
        self.max_memory_mb = Some(mb);
        self
    }

    pub fn used_memory(mut self, mb: u32) -> Self {
        self.used_memory_mb = Some(mb);
        self
    }

    pub fn max_simultaneously_starting_services(mut self, count: u32) -> Self {
        self.max_simultaneously_starting_services = Some(count);
        self
    }

    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = Some(authenticated);
        self
    }

    pub fn templates_ready(mut self, ready: bool) -> Self {
        self.templates_ready = Some(ready);
        self
    }
}

impl Updater for WrapperUpdater {
    type Value = Wrapper;

    fn baseline(&self) -> &Wrapper {
        &self.baseline
    }

    fn merge(&self) -> Wrapper {
        let base = &self.baseline;
        Wrapper {
            name: base.name.clone(),
            host: base.host.clone(),
            max_memory_mb: self.max_memory_mb.unwrap_or(base.max_memory_mb),
            used_memory_mb: self.used_memory_mb.unwrap_or(base.used_memory_mb),
            max_simultaneously_starting_services: self
                .max_simultaneously_starting_services
                .unwrap_or(base.max_simultaneously_starting_services),
            authenticated: self.authenticated.unwrap_or(base.authenticated),
            templates_ready: self.templates_ready.unwrap_or(base.templates_ready),
        }
    }

    fn has_changes(&self) -> bool {
        self.max_memory_mb.is_some()
            || self.used_memory_mb.is_some()
            || self.max_simultaneously_starting_services.is_some()
            || self.authenticated.is_some()
            || self.templates_ready.is_some()
    }
}
