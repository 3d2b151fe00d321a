//! Applies received sync messages to the local cache lists.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    CacheUpdateMessage, ErrorMessage, HelloAckMessage, HelloMessage, PROTOCOL_VERSION, SyncMessage,
};
use crate::registry::CacheListManager;
use crate::value_types::ValueTypeRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns incoming requests into replies.
///
/// Cheap to clone; every clone shares the same lists.
#[derive(Clone)]
pub struct PacketHandler {
    node_name: String,
    lists: Arc<CacheListManager>,
    types: Arc<ValueTypeRegistry>,
}

impl PacketHandler {
    pub fn new(
        node_name: impl Into<String>,
        lists: Arc<CacheListManager>,
        types: Arc<ValueTypeRegistry>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            lists,
            types,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn lists(&self) -> &Arc<CacheListManager> {
        &self.lists
    }

    /// The `Hello` this node sends when it opens a connection.
    pub fn hello(&self) -> HelloMessage {
        HelloMessage::new(&self.node_name).with_lists(self.lists.names())
    }

    /// Handles one request and returns its reply.
    pub async fn handle(&self, message: SyncMessage) -> SyncMessage {
        match message {
            SyncMessage::Hello(hello) => SyncMessage::HelloAck(self.handle_hello(&hello)),
            SyncMessage::CacheUpdate(update) => match self.apply_cache_update(update).await {
                Ok(()) => SyncMessage::Ack,
                Err(e) => {
                    warn!("Rejected cache update: {}", e);
                    SyncMessage::Error(ErrorMessage::from(&e))
                }
            },
            SyncMessage::Ping(n) => SyncMessage::Pong(n),
            other => {
                warn!("Unexpected request: {:?}", other);
                SyncMessage::Error(ErrorMessage::internal("unexpected message"))
            }
        }
    }

    /// Accepts peers speaking the same protocol version.
    pub fn handle_hello(&self, hello: &HelloMessage) -> HelloAckMessage {
        if hello.version != PROTOCOL_VERSION {
            warn!(
                "Rejecting {}: protocol version {} (expected {})",
                hello.node_name, hello.version, PROTOCOL_VERSION
            );
            return HelloAckMessage::reject(
                &self.node_name,
                ErrorMessage::version_mismatch(PROTOCOL_VERSION, hello.version).message,
            );
        }
        debug!("Hello from {} with {} list(s)", hello.node_name, hello.list_names.len());
        HelloAckMessage::accept(&self.node_name)
    }

    /// Decodes `update` and replays it on the target list with
    /// `from_packet` set.
    ///
    /// A packet for a list this node does not have is ignored: not every
    /// component registers every list.
    pub async fn apply_cache_update(&self, update: CacheUpdateMessage) -> SyncResult<()> {
        let list = match self.lists.require(&update.list_name) {
            Ok(list) => list,
            Err(e @ SyncError::UnknownList(_)) => {
                debug!("Ignoring {:?}: {}", update.action, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let value = self.types.decode(&update.value_type, &update.json_data)?;
        if list.value_type() != update.value_type {
            return Err(SyncError::TypeMismatch {
                list: update.list_name,
                expected: list.value_type(),
                got: update.value_type,
            });
        }

        debug!("Applying {:?} to {}", update.action, update.list_name);
        list.apply_remote(update.action, value).await
    }
}

impl std::fmt::Debug for PacketHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketHandler")
            .field("node_name", &self.node_name)
            .field("lists", &self.lists)
            .finish()
    }
}
