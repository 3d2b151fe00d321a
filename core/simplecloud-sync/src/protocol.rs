//! Sync protocol messages and types.
//!
//! Every message is a request answered by exactly one reply:
//! 1. `Hello` is answered by `HelloAck` once per connection
//! 2. `CacheUpdate` carries one changed or removed value and is answered by
//!    `Ack` or `Error`
//! 3. `Ping` is answered by `Pong`
//!
//! There is no logical clock: the last update to arrive wins on each node.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use simplecloud_types::CacheValue;

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u32 = 1;

/// A sync protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// Handshake message sent when connecting.
    Hello(HelloMessage),

    /// Response to a Hello message.
    HelloAck(HelloAckMessage),

    /// A value changed or was removed on the sender.
    CacheUpdate(CacheUpdateMessage),

    /// Generic success reply.
    Ack,

    /// Ping for keepalive.
    Ping(u64),

    /// Pong response.
    Pong(u64),

    /// Error reply.
    Error(ErrorMessage),
}

impl SyncMessage {
    /// Returns true for replies that report success.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error(_))
    }
}

/// What the receiver should do with a [`CacheUpdateMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncAction {
    Update,
    Delete,
}

/// One cached value on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheUpdateMessage {
    /// Registry name of the target list (e.g. `group-cache`).
    pub list_name: String,
    /// Discriminator selecting the decoder for `json_data`.
    pub value_type: String,
    /// JSON representation of the value.
    pub json_data: String,
    pub action: SyncAction,
}

impl CacheUpdateMessage {
    /// Encodes `value` for the list `list_name`.
    pub fn encode<V: CacheValue>(
        list_name: impl Into<String>,
        value: &V,
        action: SyncAction,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            list_name: list_name.into(),
            value_type: V::TYPE_NAME.to_string(),
            json_data: serde_json::to_string(value)?,
            action,
        })
    }
}

/// Initial handshake message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloMessage {
    /// Protocol version.
    pub version: u32,
    /// Component name (e.g. `Manager`, `Wrapper-1`).
    pub node_name: String,
    /// Cache lists the sender has registered.
    #[serde(default)]
    pub list_names: Vec<String>,
}

impl HelloMessage {
    /// Creates a new Hello message.
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            node_name: node_name.into(),
            list_names: Vec::new(),
        }
    }

    /// Adds the sender's list names.
    pub fn with_lists(mut self, names: Vec<String>) -> Self {
        self.list_names = names;
        self
    }
}

/// Response to Hello message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloAckMessage {
    /// Protocol version.
    pub version: u32,
    /// Responder's component name.
    pub node_name: String,
    /// Whether the connection is accepted.
    pub accepted: bool,
    /// Reason if not accepted.
    pub reason: Option<String>,
}

impl HelloAckMessage {
    /// Creates an accepting HelloAck.
    pub fn accept(node_name: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            node_name: node_name.into(),
            accepted: true,
            reason: None,
        }
    }

    /// Creates a rejecting HelloAck.
    pub fn reject(node_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            node_name: node_name.into(),
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

/// Error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorMessage {
    /// Creates a new error message.
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Version mismatch error.
    pub fn version_mismatch(expected: u32, got: u32) -> Self {
        Self::new(
            1,
            format!("protocol version mismatch: expected {expected}, got {got}"),
        )
    }

    /// Internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(99, msg)
    }
}

impl From<&SyncError> for ErrorMessage {
    fn from(err: &SyncError) -> Self {
        let code = match err {
            SyncError::MalformedPayload { .. } | SyncError::Serialization(_) => 400,
            SyncError::UnknownType(_) | SyncError::UnknownList(_) => 404,
            SyncError::TypeMismatch { .. } => 409,
            SyncError::GroupInUse { .. } => 423,
            SyncError::Timeout => 408,
            _ => 99,
        };
        Self::new(code, err.to_string())
    }
}
