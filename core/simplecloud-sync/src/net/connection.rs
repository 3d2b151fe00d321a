//! Handle for one TCP connection to a peer.
//!
//! The connection's reader and writer run as separate tasks; this handle
//! queues outbound frames and matches replies to the requests that are
//! waiting for them.

use crate::error::{SyncError, SyncResult};
use crate::net::codec::Frame;
use crate::protocol::SyncMessage;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub struct PeerConnection {
    id: u64,
    addr: SocketAddr,
    /// Remote component name, known after the handshake.
    node_name: RwLock<Option<String>>,
    outbound: mpsc::Sender<Frame>,
    pending: DashMap<u64, oneshot::Sender<SyncMessage>>,
    next_frame_id: AtomicU64,
    connected: AtomicBool,
}

impl std::fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerConnection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("node_name", &*self.node_name.read())
            .field("pending", &self.pending.len())
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}

impl PeerConnection {
    pub fn new(id: u64, addr: SocketAddr, outbound: mpsc::Sender<Frame>) -> Self {
        Self {
            id,
            addr,
            node_name: RwLock::new(None),
            outbound,
            pending: DashMap::new(),
            next_frame_id: AtomicU64::new(1),
            connected: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The remote component name, or its address before the handshake.
    pub fn node_name(&self) -> String {
        self.node_name
            .read()
            .clone()
            .unwrap_or_else(|| self.addr.to_string())
    }

    pub fn set_node_name(&self, name: impl Into<String>) {
        *self.node_name.write() = Some(name.into());
    }

    pub fn has_handshake(&self) -> bool {
        self.node_name.read().is_some()
    }

    /// Sends `message` and waits up to `timeout` for the reply.
    pub async fn request(&self, message: SyncMessage, timeout: Duration) -> SyncResult<SyncMessage> {
        if !self.is_connected() {
            return Err(SyncError::Network(format!("{} is disconnected", self.node_name())));
        }

        let frame_id = self.next_frame_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(frame_id, tx);
        // Also clears the entry when the caller drops this future early.
        let _slot = PendingSlot {
            pending: &self.pending,
            frame_id,
        };

        if self.outbound.send(Frame::request(frame_id, message)).await.is_err() {
            return Err(SyncError::ChannelClosed);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(SyncError::ChannelClosed),
            Err(_) => Err(SyncError::Timeout),
        }
    }

    /// Queues the reply to request `frame_id`.
    pub async fn respond(&self, frame_id: u64, message: SyncMessage) -> SyncResult<()> {
        self.outbound
            .send(Frame::response(frame_id, message))
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Hands a received reply to its waiting request. Returns false if
    /// nobody waits for `frame_id` anymore.
    pub fn complete(&self, frame_id: u64, message: SyncMessage) -> bool {
        match self.pending.remove(&frame_id) {
            Some((_, tx)) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Marks the connection as closed and fails all waiting requests.
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.pending.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }
}

/// Removes a pending reply entry when its request ends, however it ends.
struct PendingSlot<'a> {
    pending: &'a DashMap<u64, oneshot::Sender<SyncMessage>>,
    frame_id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.frame_id);
    }
}
