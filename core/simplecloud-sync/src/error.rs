//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A value could not be encoded for the wire.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No cache list is registered under this name.
    #[error("unknown cache list: {0}")]
    UnknownList(String),

    /// The value type discriminator is not registered.
    #[error("unknown value type: {0}")]
    UnknownType(String),

    /// The payload did not decode into the announced type.
    #[error("malformed payload for {value_type}: {reason}")]
    MalformedPayload { value_type: String, reason: String },

    /// A decoded value was routed to a list holding another type.
    #[error("cache list {list} holds {expected}, got {got}")]
    TypeMismatch {
        list: String,
        expected: &'static str,
        got: String,
    },

    /// A cache list with this name is already registered.
    #[error("cache list already registered: {0}")]
    DuplicateList(String),

    /// The group still has registered services.
    #[error("cannot delete group {group} while {services} service(s) are registered")]
    GroupInUse { group: String, services: usize },

    /// Some peers did not accept a broadcast.
    #[error("broadcast reached {delivered}/{total} peer(s): {reason}")]
    Broadcast {
        delivered: usize,
        total: usize,
        reason: String,
    },

    /// A persistence hook failed after the change was applied locally.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Protocol error (unexpected or invalid message).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,
}

impl SyncError {
    /// Builds a [`SyncError::MalformedPayload`].
    pub fn malformed(value_type: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            value_type: value_type.into(),
            reason: reason.to_string(),
        }
    }
}
