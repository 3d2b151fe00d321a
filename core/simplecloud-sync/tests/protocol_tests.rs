//! Tests for protocol.rs: wire shapes and error codes.

use pretty_assertions::assert_eq;
use simplecloud_sync::protocol::{CacheUpdateMessage, ErrorMessage, HelloAckMessage, HelloMessage, PROTOCOL_VERSION};
use simplecloud_sync::{SyncAction, SyncError, SyncMessage};
use simplecloud_types::{CacheValue, Wrapper};

#[test]
fn cache_update_wire_shape() {
    let wrapper = Wrapper::new("Wrapper-1", "10.0.0.2", 8192);
    let message = CacheUpdateMessage::encode("wrapper-cache", &wrapper, SyncAction::Update).unwrap();

    let json = serde_json::to_value(SyncMessage::CacheUpdate(message.clone())).unwrap();
    let body = &json["CacheUpdate"];
    assert_eq!(body["list_name"], "wrapper-cache");
    assert_eq!(body["value_type"], Wrapper::TYPE_NAME);
    assert_eq!(body["action"], "UPDATE");

    let decoded: Wrapper = serde_json::from_str(&message.json_data).unwrap();
    assert_eq!(decoded, wrapper);
}

#[test]
fn delete_action_is_uppercase() {
    assert_eq!(serde_json::to_string(&SyncAction::Delete).unwrap(), "\"DELETE\"");
}

#[test]
fn hello_defaults_to_current_version() {
    let hello = HelloMessage::new("Manager").with_lists(vec!["group-cache".to_string()]);
    assert_eq!(hello.version, PROTOCOL_VERSION);
    assert_eq!(hello.list_names, vec!["group-cache"]);

    // Older peers may omit the list names.
    let parsed: HelloMessage =
        serde_json::from_str(r#"{"version":1,"node_name":"Wrapper-1"}"#).unwrap();
    assert!(parsed.list_names.is_empty());
}

#[test]
fn hello_ack_constructors() {
    assert!(HelloAckMessage::accept("Manager").accepted);
    let reject = HelloAckMessage::reject("Manager", "nope");
    assert!(!reject.accepted);
    assert_eq!(reject.reason.as_deref(), Some("nope"));
}

#[test]
fn error_codes() {
    let cases = [
        (SyncError::malformed("template", "eof"), 400),
        (SyncError::UnknownType("x".into()), 404),
        (SyncError::UnknownList("x".into()), 404),
        (
            SyncError::TypeMismatch {
                list: "group-cache".into(),
                expected: "service-group",
                got: "template".into(),
            },
            409,
        ),
        (
            SyncError::GroupInUse {
                group: "Lobby".into(),
                services: 2,
            },
            423,
        ),
        (SyncError::Timeout, 408),
        (SyncError::ChannelClosed, 99),
    ];
    for (err, code) in cases {
        let message = ErrorMessage::from(&err);
        assert_eq!(message.code, code, "{err}");
        assert_eq!(message.message, err.to_string());
    }
}

#[test]
fn only_error_replies_are_failures() {
    assert!(SyncMessage::Ack.is_success());
    assert!(SyncMessage::Pong(1).is_success());
    assert!(!SyncMessage::Error(ErrorMessage::internal("boom")).is_success());
}
