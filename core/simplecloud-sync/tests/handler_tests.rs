//! Tests for handler.rs: applying received packets, and two in-process
//! nodes talking through the loopback broadcaster.

use pretty_assertions::assert_eq;
use simplecloud_sync::domain::{GROUP_CACHE, PLAYER_CACHE, SERVICE_CACHE};
use simplecloud_sync::protocol::{CacheUpdateMessage, HelloMessage, PROTOCOL_VERSION};
use simplecloud_sync::transport::mock::{LoopbackBroadcaster, RecordingBroadcaster};
use simplecloud_sync::{
    CloudContext, ManagedCacheList, NodeRole, SyncAction, SyncConfig, SyncMessage,
};
use simplecloud_types::{
    CloudPlayer, CloudService, PlayerId, ServiceGroup, ServiceGroupType, ServiceState,
};
use std::sync::Arc;

fn node(name: &str, role: NodeRole) -> (CloudContext, Arc<RecordingBroadcaster>) {
    let recorder = Arc::new(RecordingBroadcaster::new());
    let context = CloudContext::builder(SyncConfig {
        node_name: name.to_string(),
        role,
        ..SyncConfig::default()
    })
    .broadcaster(recorder.clone())
    .build()
    .unwrap();
    (context, recorder)
}

fn error_code(reply: &SyncMessage) -> Option<u32> {
    match reply {
        SyncMessage::Error(e) => Some(e.code),
        _ => None,
    }
}

#[tokio::test]
async fn applies_update_without_rebroadcast() {
    let (wrapper, recorder) = node("Wrapper-1", NodeRole::Wrapper);
    let handler = wrapper.handler();
    let group = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    let message = CacheUpdateMessage::encode(GROUP_CACHE, &group, SyncAction::Update).unwrap();

    let reply = handler.handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(reply, SyncMessage::Ack);
    assert_eq!(wrapper.groups().get_by_name("lobby").as_deref(), Some(&group));
    assert!(recorder.sent().is_empty());
}

#[tokio::test]
async fn update_packet_replaces_cached_value() {
    let (wrapper, recorder) = node("Wrapper-1", NodeRole::Wrapper);
    let group = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    ManagedCacheList::update(wrapper.groups().as_ref(), group.clone(), true)
        .await
        .unwrap();
    let mut events = wrapper.subscribe();

    let mut changed = group.clone();
    changed.maintenance = true;
    let message = CacheUpdateMessage::encode(GROUP_CACHE, &changed, SyncAction::Update).unwrap();
    let reply = wrapper.handler().handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(reply, SyncMessage::Ack);
    assert_eq!(wrapper.groups().get_by_name("Lobby").as_deref(), Some(&changed));
    assert_eq!(wrapper.groups().list().len(), 1);
    assert!(recorder.sent().is_empty());

    let mut names = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        assert!(envelope.from_packet);
        names.push(envelope.event.name());
    }
    assert_eq!(names, vec!["group-updated"]);
}

#[tokio::test]
async fn applies_delete() {
    let (wrapper, recorder) = node("Wrapper-1", NodeRole::Wrapper);
    let group = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    ManagedCacheList::update(wrapper.groups().as_ref(), group.clone(), true)
        .await
        .unwrap();

    let message = CacheUpdateMessage::encode(GROUP_CACHE, &group, SyncAction::Delete).unwrap();
    let reply = wrapper.handler().handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(reply, SyncMessage::Ack);
    assert!(wrapper.groups().get_by_name("Lobby").is_none());
    assert!(recorder.sent().is_empty());
}

#[tokio::test]
async fn unknown_list_is_ignored() {
    let (wrapper, _) = node("Wrapper-1", NodeRole::Wrapper);
    let group = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    let message = CacheUpdateMessage::encode("stats-cache", &group, SyncAction::Update).unwrap();

    let reply = wrapper.handler().handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(reply, SyncMessage::Ack);
    assert!(wrapper.groups().list().is_empty());
}

#[tokio::test]
async fn unknown_type_is_rejected() {
    let (wrapper, _) = node("Wrapper-1", NodeRole::Wrapper);
    let message = CacheUpdateMessage {
        list_name: GROUP_CACHE.to_string(),
        value_type: "cloud-permission-group".to_string(),
        json_data: "{}".to_string(),
        action: SyncAction::Update,
    };

    let reply = wrapper.handler().handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(error_code(&reply), Some(404));
}

#[tokio::test]
async fn malformed_payload_is_rejected() {
    let (wrapper, _) = node("Wrapper-1", NodeRole::Wrapper);
    let message = CacheUpdateMessage {
        list_name: GROUP_CACHE.to_string(),
        value_type: "service-group".to_string(),
        json_data: "{\"name\": ".to_string(),
        action: SyncAction::Update,
    };

    let reply = wrapper.handler().handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(error_code(&reply), Some(400));
    assert!(wrapper.groups().list().is_empty());
}

#[tokio::test]
async fn value_for_wrong_list_is_rejected() {
    let (wrapper, _) = node("Wrapper-1", NodeRole::Wrapper);
    let group = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    let message = CacheUpdateMessage::encode(SERVICE_CACHE, &group, SyncAction::Update).unwrap();

    let reply = wrapper.handler().handle(SyncMessage::CacheUpdate(message)).await;

    assert_eq!(error_code(&reply), Some(409));
    assert!(wrapper.services().list().is_empty());
}

#[tokio::test]
async fn hello_checks_version() {
    let (manager, _) = node("Manager", NodeRole::Manager);
    let handler = manager.handler();

    match handler.handle(SyncMessage::Hello(HelloMessage::new("Wrapper-1"))).await {
        SyncMessage::HelloAck(ack) => {
            assert!(ack.accepted);
            assert_eq!(ack.node_name, "Manager");
            assert_eq!(ack.version, PROTOCOL_VERSION);
        }
        other => panic!("unexpected reply {other:?}"),
    }

    let mut old = HelloMessage::new("Wrapper-0");
    old.version = PROTOCOL_VERSION + 1;
    match handler.handle(SyncMessage::Hello(old)).await {
        SyncMessage::HelloAck(ack) => {
            assert!(!ack.accepted);
            assert!(ack.reason.unwrap().contains("version mismatch"));
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn ping_pong() {
    let (manager, _) = node("Manager", NodeRole::Manager);
    assert_eq!(manager.handler().handle(SyncMessage::Ping(7)).await, SyncMessage::Pong(7));
}

#[tokio::test]
async fn hello_lists_registered_caches() {
    let (manager, _) = node("Manager", NodeRole::Manager);
    let hello = manager.handler().hello();
    assert_eq!(hello.node_name, "Manager");
    assert!(hello.list_names.contains(&PLAYER_CACHE.to_string()));
    assert_eq!(hello.list_names.len(), 5);
}

// ── two nodes over loopback ─────────────────────────────────────

struct Pair {
    manager: CloudContext,
    wrapper: CloudContext,
}

fn pair() -> Pair {
    let to_wrapper = Arc::new(LoopbackBroadcaster::new());
    let to_manager = Arc::new(LoopbackBroadcaster::new());

    let manager = CloudContext::builder(SyncConfig::default())
        .broadcaster(to_wrapper.clone())
        .build()
        .unwrap();
    let wrapper = CloudContext::builder(SyncConfig {
        node_name: "Wrapper-1".to_string(),
        role: NodeRole::Wrapper,
        ..SyncConfig::default()
    })
    .broadcaster(to_manager.clone())
    .build()
    .unwrap();

    to_wrapper.connect("Wrapper-1", wrapper.handler());
    to_manager.connect("Manager", manager.handler());
    Pair { manager, wrapper }
}

#[tokio::test]
async fn update_reaches_peer_exactly_once() {
    let Pair { manager, wrapper } = pair();
    let mut manager_events = manager.subscribe();
    let mut wrapper_events = wrapper.subscribe();

    let group = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    ManagedCacheList::update(manager.groups().as_ref(), group.clone(), false)
        .await
        .unwrap();

    assert_eq!(wrapper.groups().get_by_name("Lobby").as_deref(), Some(&group));

    let local = manager_events.try_recv().unwrap();
    assert!(!local.from_packet);
    let remote = wrapper_events.try_recv().unwrap();
    assert!(remote.from_packet);
    assert_eq!(remote.event.name(), "group-created");
    assert!(wrapper_events.try_recv().is_err());
    assert!(manager_events.try_recv().is_err());
}

#[tokio::test]
async fn delete_reaches_peer() {
    let Pair { manager, wrapper } = pair();
    let lists = manager.services();
    let mut service = CloudService::new("Lobby", 1, 30000);
    ManagedCacheList::update(lists.as_ref(), service.clone(), false)
        .await
        .unwrap();
    assert!(wrapper.services().get_by_name("lobby-1").is_some());

    service.state = ServiceState::Closed;
    let mut wrapper_events = wrapper.subscribe();
    ManagedCacheList::delete(lists.as_ref(), service, false)
        .await
        .unwrap();

    assert!(wrapper.services().get_by_name("Lobby-1").is_none());
    let names: Vec<_> = std::iter::from_fn(|| wrapper_events.try_recv().ok())
        .map(|e| e.event.name())
        .collect();
    // The final-state update arrives first, then the delete replays it once
    // more before removing.
    assert_eq!(
        names,
        vec![
            "service-updated",
            "service-state-changed",
            "service-updated",
            "service-unregistered"
        ]
    );
}

#[tokio::test]
async fn manager_does_not_spread_players() {
    let Pair { manager, wrapper } = pair();
    let player = CloudPlayer::new(PlayerId::new(), "Notch", "Proxy-1");

    ManagedCacheList::update(manager.players().as_ref(), player.clone(), false)
        .await
        .unwrap();
    assert_eq!(manager.players().online_count(), 1);
    assert_eq!(wrapper.players().online_count(), 0);

    // Other components do spread theirs.
    let other = CloudPlayer::new(PlayerId::new(), "jeb_", "Proxy-1");
    ManagedCacheList::update(wrapper.players().as_ref(), other.clone(), false)
        .await
        .unwrap();
    assert!(manager.players().get_by_id(other.unique_id).is_some());
}
