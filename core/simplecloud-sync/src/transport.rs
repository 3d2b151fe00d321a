//! Transport layer abstraction.
//!
//! A cache list only needs to reach every connected peer with one message
//! and learn how many accepted it. The TCP implementation lives in
//! [`crate::net`]; the `mock` module provides in-process variants for tests.

use crate::error::{SyncError, SyncResult};
use crate::protocol::SyncMessage;
use async_trait::async_trait;

/// Outcome of one broadcast round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers connected when the round started.
    pub total: usize,
    /// Peers that answered with a success reply.
    pub delivered: usize,
    /// `(peer, reason)` for every failed delivery.
    pub failures: Vec<(String, String)>,
}

impl BroadcastReport {
    /// Report for a round that had nobody to send to.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.delivered == self.total
    }

    /// `Ok` if every peer accepted, [`SyncError::Broadcast`] otherwise.
    pub fn into_result(self) -> SyncResult<()> {
        if self.is_complete() {
            return Ok(());
        }
        let reason = self
            .failures
            .iter()
            .map(|(peer, reason)| format!("{peer}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ");
        Err(SyncError::Broadcast {
            delivered: self.delivered,
            total: self.total,
            reason,
        })
    }
}

/// Sends one message to every connected peer.
#[async_trait]
pub trait PeerBroadcaster: Send + Sync {
    /// Delivers `message` to all peers and waits for their replies.
    async fn send_to_all_peers(&self, message: &SyncMessage) -> SyncResult<BroadcastReport>;

    /// Number of peers a broadcast would currently reach.
    fn peer_count(&self) -> usize;
}

/// Broadcaster for a node without peers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcaster;

#[async_trait]
impl PeerBroadcaster for NoopBroadcaster {
    async fn send_to_all_peers(&self, _message: &SyncMessage) -> SyncResult<BroadcastReport> {
        Ok(BroadcastReport::empty())
    }

    fn peer_count(&self) -> usize {
        0
    }
}

/// In-process broadcasters for tests.
pub mod mock {
    use super::*;
    use crate::handler::PacketHandler;
    use crate::protocol::CacheUpdateMessage;
    use parking_lot::{Mutex, RwLock};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records every broadcast message instead of sending it.
    #[derive(Debug)]
    pub struct RecordingBroadcaster {
        sent: Mutex<Vec<SyncMessage>>,
        fail: AtomicBool,
        peers: usize,
    }

    impl RecordingBroadcaster {
        /// A recorder that pretends to have one peer.
        pub fn new() -> Self {
            Self::with_peers(1)
        }

        pub fn with_peers(peers: usize) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                peers,
            }
        }

        /// Makes subsequent broadcasts report every peer as failed.
        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        /// All recorded messages, oldest first.
        pub fn sent(&self) -> Vec<SyncMessage> {
            self.sent.lock().clone()
        }

        /// Recorded cache updates, oldest first.
        pub fn cache_updates(&self) -> Vec<CacheUpdateMessage> {
            self.sent
                .lock()
                .iter()
                .filter_map(|m| match m {
                    SyncMessage::CacheUpdate(update) => Some(update.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn clear(&self) {
            self.sent.lock().clear();
        }
    }

    impl Default for RecordingBroadcaster {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PeerBroadcaster for RecordingBroadcaster {
        async fn send_to_all_peers(&self, message: &SyncMessage) -> SyncResult<BroadcastReport> {
            self.sent.lock().push(message.clone());
            if self.fail.load(Ordering::SeqCst) {
                return Ok(BroadcastReport {
                    total: self.peers,
                    delivered: 0,
                    failures: (0..self.peers)
                        .map(|i| (format!("peer-{i}"), "unreachable".to_string()))
                        .collect(),
                });
            }
            Ok(BroadcastReport {
                total: self.peers,
                delivered: self.peers,
                failures: Vec::new(),
            })
        }

        fn peer_count(&self) -> usize {
            self.peers
        }
    }

    /// Delivers broadcasts straight into the packet handlers of other
    /// in-process nodes.
    #[derive(Default)]
    pub struct LoopbackBroadcaster {
        peers: RwLock<Vec<(String, PacketHandler)>>,
    }

    impl LoopbackBroadcaster {
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a node that receives every broadcast from now on.
        pub fn connect(&self, name: impl Into<String>, handler: PacketHandler) {
            self.peers.write().push((name.into(), handler));
        }

        pub fn disconnect(&self, name: &str) {
            self.peers.write().retain(|(peer, _)| peer != name);
        }
    }

    #[async_trait]
    impl PeerBroadcaster for LoopbackBroadcaster {
        async fn send_to_all_peers(&self, message: &SyncMessage) -> SyncResult<BroadcastReport> {
            let peers = self.peers.read().clone();
            let mut report = BroadcastReport {
                total: peers.len(),
                ..BroadcastReport::default()
            };
            for (name, handler) in peers {
                match handler.handle(message.clone()).await {
                    SyncMessage::Error(e) => report.failures.push((name, e.message)),
                    _ => report.delivered += 1,
                }
            }
            Ok(report)
        }

        fn peer_count(&self) -> usize {
            self.peers.read().len()
        }
    }
}
