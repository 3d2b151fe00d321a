//! Tests for registry.rs: list registration and lookup.

use simplecloud_sync::domain::{GROUP_CACHE, ServiceGroupExecutor, TEMPLATE_CACHE, TemplateExecutor};
use simplecloud_sync::{
    CacheList, CacheListConfig, CacheListManager, ErasedCacheList, EventBus, NoopBroadcaster,
    SyncAction, SyncError,
};
use simplecloud_types::{ServiceGroup, ServiceGroupType, Template};
use std::sync::Arc;

fn groups() -> Arc<CacheList<ServiceGroup>> {
    Arc::new(CacheList::new(
        Arc::new(ServiceGroupExecutor),
        EventBus::default(),
        Arc::new(NoopBroadcaster),
        CacheListConfig::default(),
    ))
}

fn templates() -> Arc<CacheList<Template>> {
    Arc::new(CacheList::new(
        Arc::new(TemplateExecutor),
        EventBus::default(),
        Arc::new(NoopBroadcaster),
        CacheListConfig::default(),
    ))
}

#[test]
fn register_and_lookup() {
    let manager = CacheListManager::new();
    manager.register_cache_list(groups()).unwrap();
    manager.register_cache_list(templates()).unwrap();

    assert_eq!(manager.len(), 2);
    assert_eq!(manager.names(), vec![GROUP_CACHE, TEMPLATE_CACHE]);

    let list = manager.get_cache_list_by_name(GROUP_CACHE).unwrap();
    assert_eq!(list.value_type(), "service-group");
    assert!(manager.get_cache_list_by_name("nope").is_none());
    assert!(manager.require(GROUP_CACHE).is_ok());
    assert!(matches!(
        manager.require("nope"),
        Err(SyncError::UnknownList(name)) if name == "nope"
    ));
}

#[test]
fn duplicate_name_is_rejected() {
    let manager = CacheListManager::new();
    let first = groups();
    manager.register_cache_list(first.clone()).unwrap();

    let err = manager.register_cache_list(groups()).unwrap_err();

    assert!(matches!(err, SyncError::DuplicateList(name) if name == GROUP_CACHE));
    assert_eq!(manager.len(), 1);
}

#[test]
fn unregister_frees_the_name() {
    let manager = CacheListManager::new();
    manager.register_cache_list(groups()).unwrap();

    assert!(manager.unregister(GROUP_CACHE).is_some());
    assert!(manager.is_empty());
    manager.register_cache_list(groups()).unwrap();
}

#[tokio::test]
async fn snapshot_messages_cover_every_list() {
    let manager = CacheListManager::new();
    let groups = groups();
    let templates = templates();
    manager.register_cache_list(groups.clone()).unwrap();
    manager.register_cache_list(templates.clone()).unwrap();

    groups.update(ServiceGroup::new("Lobby", ServiceGroupType::Lobby), false).await.unwrap();
    groups.update(ServiceGroup::new("Proxy", ServiceGroupType::Proxy), false).await.unwrap();
    templates.update(Template::new("Lobby"), false).await.unwrap();

    let messages = manager.snapshot_messages().unwrap();
    let lists: Vec<_> = messages.iter().map(|m| m.list_name.as_str()).collect();
    assert_eq!(lists, vec![GROUP_CACHE, GROUP_CACHE, TEMPLATE_CACHE]);
    assert!(messages.iter().all(|m| m.action == SyncAction::Update));
}

#[tokio::test]
async fn apply_remote_rejects_foreign_values() {
    let groups = groups();
    let erased: Arc<dyn ErasedCacheList> = groups.clone();

    let err = erased
        .apply_remote(SyncAction::Update, Box::new(Template::new("Lobby")))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::TypeMismatch { expected: "service-group", .. }));
    assert!(groups.is_empty());
}

#[tokio::test]
async fn apply_remote_replays_without_broadcast() {
    let groups = groups();
    let erased: Arc<dyn ErasedCacheList> = groups.clone();

    erased
        .apply_remote(
            SyncAction::Update,
            Box::new(ServiceGroup::new("Lobby", ServiceGroupType::Lobby)),
        )
        .await
        .unwrap();
    assert_eq!(erased.len(), 1);

    erased
        .apply_remote(
            SyncAction::Delete,
            Box::new(ServiceGroup::new("lobby", ServiceGroupType::Lobby)),
        )
        .await
        .unwrap();
    assert_eq!(erased.len(), 0);
}
