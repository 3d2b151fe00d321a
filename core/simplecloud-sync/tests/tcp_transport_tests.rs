//! Tests for net/transport.rs: two nodes over localhost TCP.

use simplecloud_sync::net::TcpTransport;
use simplecloud_sync::{CloudContext, ManagedCacheList, NodeRole, PeerBroadcaster, SyncConfig, SyncMessage};
use simplecloud_types::{ServiceGroup, ServiceGroupType, Template, Wrapper};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

struct Node {
    context: CloudContext,
    transport: Arc<TcpTransport>,
}

fn node(name: &str, role: NodeRole) -> Node {
    let config = SyncConfig {
        node_name: name.to_string(),
        role,
        ..SyncConfig::default()
    };
    let transport = TcpTransport::new(name, config.request_timeout());
    let context = CloudContext::builder(config)
        .broadcaster(transport.clone())
        .build()
        .unwrap();
    transport.attach(context.handler()).unwrap();
    Node { context, transport }
}

fn localhost() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn handshake_registers_both_sides() {
    let manager = node("Manager", NodeRole::Manager);
    let wrapper = node("Wrapper-1", NodeRole::Wrapper);
    let addr = manager.transport.listen(localhost()).await.unwrap();
    assert_eq!(manager.transport.local_addr(), Some(addr));

    let remote = wrapper.transport.connect(addr).await.unwrap();

    assert_eq!(remote, "Manager");
    assert_eq!(wrapper.transport.peer_names(), vec!["Manager"]);
    wait_until(|| manager.transport.peer_count() == 1).await;
    assert_eq!(manager.transport.peer_names(), vec!["Wrapper-1"]);
}

#[tokio::test]
async fn new_peer_receives_cached_objects() {
    let manager = node("Manager", NodeRole::Manager);
    let groups = manager.context.groups();
    ManagedCacheList::update(groups.as_ref(), ServiceGroup::new("Lobby", ServiceGroupType::Lobby), false)
        .await
        .unwrap();
    ManagedCacheList::update(manager.context.templates().as_ref(), Template::new("Lobby"), false)
        .await
        .unwrap();
    let addr = manager.transport.listen(localhost()).await.unwrap();

    let wrapper = node("Wrapper-1", NodeRole::Wrapper);
    wrapper.transport.connect(addr).await.unwrap();

    wait_until(|| {
        wrapper.context.groups().get_by_name("Lobby").is_some()
            && wrapper.context.templates().get_by_name("Lobby").is_some()
    })
    .await;
}

#[tokio::test]
async fn updates_flow_both_ways() {
    let manager = node("Manager", NodeRole::Manager);
    let wrapper = node("Wrapper-1", NodeRole::Wrapper);
    let addr = manager.transport.listen(localhost()).await.unwrap();
    wrapper.transport.connect(addr).await.unwrap();
    wait_until(|| manager.transport.peer_count() == 1).await;

    let group = ServiceGroup::new("BedWars", ServiceGroupType::Server);
    ManagedCacheList::update(manager.context.groups().as_ref(), group.clone(), false)
        .await
        .unwrap();
    // The broadcast waits for the peer's reply, so the change is visible now.
    assert_eq!(
        wrapper.context.groups().get_by_name("bedwars").as_deref(),
        Some(&group)
    );

    let mut self_info = Wrapper::new("Wrapper-1", "127.0.0.1", 4096);
    self_info.authenticated = true;
    ManagedCacheList::update(wrapper.context.wrappers().as_ref(), self_info, false)
        .await
        .unwrap();
    assert_eq!(manager.context.wrappers().authenticated_wrappers().len(), 1);

    ManagedCacheList::delete(manager.context.groups().as_ref(), group, false)
        .await
        .unwrap();
    assert!(wrapper.context.groups().get_by_name("BedWars").is_none());
}

#[tokio::test]
async fn broadcast_reports_every_peer() {
    let manager = node("Manager", NodeRole::Manager);
    let addr = manager.transport.listen(localhost()).await.unwrap();
    let first = node("Wrapper-1", NodeRole::Wrapper);
    let second = node("Wrapper-2", NodeRole::Wrapper);
    first.transport.connect(addr).await.unwrap();
    second.transport.connect(addr).await.unwrap();
    wait_until(|| manager.transport.peer_count() == 2).await;

    let report = manager
        .transport
        .send_to_all_peers(&SyncMessage::Ping(1))
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.delivered, 2);
    assert!(report.is_complete());
}

#[tokio::test]
async fn shutdown_disconnects_peers() {
    let manager = node("Manager", NodeRole::Manager);
    let wrapper = node("Wrapper-1", NodeRole::Wrapper);
    let addr = manager.transport.listen(localhost()).await.unwrap();
    wrapper.transport.connect(addr).await.unwrap();
    wait_until(|| manager.transport.peer_count() == 1).await;

    wrapper.transport.shutdown();

    assert_eq!(wrapper.transport.peer_count(), 0);
    wait_until(|| manager.transport.peer_count() == 0).await;
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let wrapper = node("Wrapper-1", NodeRole::Wrapper);
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(wrapper.transport.connect(addr).await.is_err());
    assert_eq!(wrapper.transport.peer_count(), 0);
}
