use pretty_assertions::assert_eq;
use simplecloud_types::{
    CacheValue, CloudPlayer, CloudService, NameKey, PlayerId, PlayerServerConnectState,
    ServiceGroup, ServiceGroupType, ServiceState, Template, Updater, Wrapper,
};

// ── CloudPlayer ───────────────────────────────────────────────────

#[test]
fn player_updater_without_changes_merges_to_baseline() {
    let player = CloudPlayer::new(PlayerId::new(), "Notch", "Proxy-1");
    let updater = player.updater();
    assert!(!updater.has_changes());
    assert_eq!(updater.merge(), player);
}

#[test]
fn player_connect_to_resets_connect_state() {
    let mut player = CloudPlayer::new(PlayerId::new(), "Notch", "Proxy-1");
    player.connected_server_name = Some("Lobby-1".into());
    player.server_connect_state = PlayerServerConnectState::Connected;

    let updater = player.updater().connect_to("Lobby-2");
    assert_eq!(updater.connected_server_name(), Some("Lobby-2"));

    let merged = updater.merge();
    assert_eq!(merged.connected_server_name.as_deref(), Some("Lobby-2"));
    assert_eq!(merged.server_connect_state, PlayerServerConnectState::Connecting);
    // Baseline untouched.
    assert_eq!(updater.baseline().connected_server_name.as_deref(), Some("Lobby-1"));
}

#[test]
fn player_updater_can_clear_server() {
    let mut player = CloudPlayer::new(PlayerId::new(), "Notch", "Proxy-1");
    player.connected_server_name = Some("Lobby-1".into());

    let merged = player.updater().connected_server(None).merge();
    assert_eq!(merged.connected_server_name, None);
}

#[test]
fn player_identity_is_unique_id() {
    let id = PlayerId::new();
    let player = CloudPlayer::new(id, "Notch", "Proxy-1");
    assert_eq!(player.cache_key(), id);
    assert_eq!(CloudPlayer::TYPE_NAME, "cloud-player");
}

// ── ServiceGroup ──────────────────────────────────────────────────

#[test]
fn group_defaults() {
    let proxy = ServiceGroup::new("Proxy", ServiceGroupType::Proxy);
    assert_eq!(proxy.template_name, "Proxy");
    assert_eq!(proxy.start_port, Some(25565));

    let lobby = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    assert_eq!(lobby.start_port, None);
}

#[test]
fn group_priority_only_applies_to_lobbies() {
    let lobby = ServiceGroup::new("Lobby", ServiceGroupType::Lobby);
    assert_eq!(lobby.updater().priority(5).merge().priority, 5);

    let server = ServiceGroup::new("BedWars", ServiceGroupType::Server);
    assert_eq!(server.updater().priority(5).merge().priority, 0);
}

#[test]
fn group_updater_merges_staged_fields_only() {
    let group = ServiceGroup::new("BedWars", ServiceGroupType::Server);
    let merged = group
        .updater()
        .maintenance(true)
        .max_online_count(Some(4))
        .merge();

    assert!(merged.maintenance);
    assert_eq!(merged.max_online_count, Some(4));
    assert_eq!(merged.max_memory_mb, group.max_memory_mb);
    assert_eq!(merged.cache_key(), NameKey::new("bedwars"));
}

// ── Template ──────────────────────────────────────────────────────

#[test]
fn template_inheritance_is_case_insensitive() {
    let template = Template::new("BedWars");
    let merged = template
        .updater()
        .add_inherited_template("EVERY")
        .add_inherited_template("Server")
        .add_inherited_template("every")
        .merge();

    assert_eq!(merged.inherited_template_names, vec!["Server".to_string(), "every".to_string()]);
}

#[test]
fn template_remove_module() {
    let mut template = Template::new("Lobby");
    template.module_names_to_copy = vec!["Sign".into(), "NPC".into()];

    let updater = template.updater().remove_module_to_copy("sign");
    assert!(updater.has_changes());
    assert_eq!(updater.merge().module_names_to_copy, vec!["NPC".to_string()]);
}

// ── Wrapper ───────────────────────────────────────────────────────

#[test]
fn wrapper_free_memory_saturates() {
    let mut wrapper = Wrapper::new("Wrapper-1", "10.0.0.2", 4096);
    wrapper.used_memory_mb = 1024;
    assert_eq!(wrapper.free_memory_mb(), 3072);

    let over = wrapper.updater().used_memory(8192).merge();
    assert_eq!(over.free_memory_mb(), 0);
}

// ── CloudService ──────────────────────────────────────────────────

#[test]
fn service_name_and_key() {
    let service = CloudService::new("Lobby", 3, 30003);
    assert_eq!(service.name(), "Lobby-3");
    assert_eq!(service.cache_key(), NameKey::new("lobby-3"));
}

#[test]
fn service_updater_changes_state() {
    let service = CloudService::new("Lobby", 1, 30001);
    let merged = service
        .updater()
        .state(ServiceState::Visible)
        .authenticated(true)
        .wrapper(Some("Wrapper-1".into()))
        .merge();

    assert_eq!(merged.state, ServiceState::Visible);
    assert!(merged.authenticated);
    assert_eq!(merged.wrapper_name.as_deref(), Some("Wrapper-1"));
    assert_eq!(merged.port, 30001);
}
