//! TCP transport between cloud components.

use crate::error::{SyncError, SyncResult};
use crate::handler::PacketHandler;
use crate::net::codec::{Frame, FrameKind, read_frame, write_frame};
use crate::net::connection::PeerConnection;
use crate::protocol::{ErrorMessage, SyncMessage};
use crate::transport::{BroadcastReport, PeerBroadcaster};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Frames buffered per connection before senders wait.
const OUTBOUND_BUFFER: usize = 256;

/// Connects cloud components over TCP.
///
/// Only peers that completed the `Hello` handshake receive broadcasts. When a
/// peer connects to a listening node, the listening node sends it every
/// cached object so it starts from the same state.
pub struct TcpTransport {
    node_name: String,
    request_timeout: Duration,
    handler: OnceLock<PacketHandler>,
    peers: DashMap<u64, Arc<PeerConnection>>,
    next_connection_id: AtomicU64,
    local_addr: OnceLock<SocketAddr>,
    shutdown: watch::Sender<bool>,
}

impl TcpTransport {
    pub fn new(node_name: impl Into<String>, request_timeout: Duration) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            node_name: node_name.into(),
            request_timeout,
            handler: OnceLock::new(),
            peers: DashMap::new(),
            next_connection_id: AtomicU64::new(1),
            local_addr: OnceLock::new(),
            shutdown,
        })
    }

    /// Sets the handler for incoming requests. Requests that arrive before
    /// this are answered with an error.
    pub fn attach(&self, handler: PacketHandler) -> SyncResult<()> {
        self.handler
            .set(handler)
            .map_err(|_| SyncError::Protocol("packet handler already attached".to_string()))
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Address the listener is bound to, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Names of all peers that completed the handshake.
    pub fn peer_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.peers.iter().map(|p| p.node_name()).collect();
        names.sort_unstable();
        names
    }

    /// Starts accepting connections on `addr`. Returns the bound address.
    pub async fn listen(self: &Arc<Self>, addr: SocketAddr) -> SyncResult<SocketAddr> {
        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?;
        let _ = self.local_addr.set(bound);
        info!("{} listening on {}", self.node_name, bound);

        let this = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer_addr)) => {
                            debug!("Accepted connection from {}", peer_addr);
                            this.spawn_connection(stream, peer_addr);
                        }
                        Err(e) => warn!("Accept failed: {}", e),
                    },
                    _ = shutdown.changed() => break,
                }
            }
            debug!("Listener on {} stopped", bound);
        });

        Ok(bound)
    }

    /// Connects to the node at `addr` and performs the handshake. Returns the
    /// remote component name.
    pub async fn connect(self: &Arc<Self>, addr: SocketAddr) -> SyncResult<String> {
        let hello = self.handler()?.hello();
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| SyncError::Network(format!("connect to {addr}: {e}")))?;
        let conn = self.spawn_connection(stream, addr);

        let reply = match conn.request(SyncMessage::Hello(hello), self.request_timeout).await {
            Ok(reply) => reply,
            Err(e) => {
                conn.close();
                return Err(e);
            }
        };
        match reply {
            SyncMessage::HelloAck(ack) if ack.accepted => {
                conn.set_node_name(&ack.node_name);
                self.peers.insert(conn.id(), Arc::clone(&conn));
                info!("Connected to {} at {}", ack.node_name, addr);
                Ok(ack.node_name)
            }
            SyncMessage::HelloAck(ack) => {
                conn.close();
                Err(SyncError::Protocol(format!(
                    "{} rejected handshake: {}",
                    ack.node_name,
                    ack.reason.unwrap_or_default()
                )))
            }
            other => {
                conn.close();
                Err(SyncError::Protocol(format!("unexpected handshake reply: {other:?}")))
            }
        }
    }

    /// Stops the listener and closes every connection.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        for peer in self.peers.iter() {
            peer.close();
        }
        self.peers.clear();
        info!("{} transport stopped", self.node_name);
    }

    fn handler(&self) -> SyncResult<&PacketHandler> {
        self.handler
            .get()
            .ok_or_else(|| SyncError::Protocol("no packet handler attached".to_string()))
    }

    fn spawn_connection(self: &Arc<Self>, stream: TcpStream, addr: SocketAddr) -> Arc<PeerConnection> {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for {}: {}", addr, e);
        }
        let (reader, mut writer) = stream.into_split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(OUTBOUND_BUFFER);
        let id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
        let conn = Arc::new(PeerConnection::new(id, addr, outbound_tx));

        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = outbound_rx.recv() => {
                        let Some(frame) = frame else { break };
                        if let Err(e) = write_frame(&mut writer, &frame).await {
                            debug!("Write to {} failed: {}", addr, e);
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });

        // Requests are applied one at a time, in arrival order, on their own
        // task so replies to our requests are never stuck behind them.
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Frame>();
        {
            let this = Arc::clone(self);
            let conn = Arc::clone(&conn);
            tokio::spawn(async move {
                while let Some(frame) = request_rx.recv().await {
                    let reply = this.handle_request(&conn, frame.message).await;
                    if conn.respond(frame.id, reply).await.is_err() {
                        break;
                    }
                }
            });
        }

        {
            let this = Arc::clone(self);
            let conn = Arc::clone(&conn);
            tokio::spawn(async move {
                this.read_loop(reader, &conn, request_tx).await;
                this.peers.remove(&conn.id());
                conn.close();
                info!("Disconnected from {}", conn.node_name());
            });
        }

        conn
    }

    async fn read_loop(
        &self,
        mut reader: OwnedReadHalf,
        conn: &PeerConnection,
        requests: mpsc::UnboundedSender<Frame>,
    ) {
        let mut shutdown = self.shutdown.subscribe();
        loop {
            let frame = tokio::select! {
                frame = read_frame(&mut reader) => frame,
                _ = shutdown.changed() => return,
            };
            match frame {
                Ok(frame) => match frame.kind {
                    FrameKind::Response => {
                        if !conn.complete(frame.id, frame.message) {
                            debug!("Dropping late reply {} from {}", frame.id, conn.node_name());
                        }
                    }
                    FrameKind::Request => {
                        if requests.send(frame).is_err() {
                            return;
                        }
                    }
                },
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return,
                Err(e) => {
                    warn!("Read from {} failed: {}", conn.node_name(), e);
                    return;
                }
            }
        }
    }

    async fn handle_request(self: &Arc<Self>, conn: &Arc<PeerConnection>, message: SyncMessage) -> SyncMessage {
        let handler = match self.handler() {
            Ok(handler) => handler,
            Err(e) => return SyncMessage::Error(ErrorMessage::from(&e)),
        };

        let hello = match message {
            SyncMessage::Hello(hello) => hello,
            other => return handler.handle(other).await,
        };

        let ack = handler.handle_hello(&hello);
        if ack.accepted && !conn.has_handshake() {
            conn.set_node_name(&hello.node_name);
            self.peers.insert(conn.id(), Arc::clone(conn));
            info!("{} joined from {}", hello.node_name, conn.addr());
            self.spawn_burst(Arc::clone(conn));
        }
        SyncMessage::HelloAck(ack)
    }

    /// Sends every cached object to a freshly connected peer.
    fn spawn_burst(&self, conn: Arc<PeerConnection>) {
        let messages = match self.handler().and_then(|h| h.lists().snapshot_messages()) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Could not snapshot lists for {}: {}", conn.node_name(), e);
                return;
            }
        };
        let timeout = self.request_timeout;
        tokio::spawn(async move {
            let total = messages.len();
            let mut failed = 0;
            for message in messages {
                match conn.request(SyncMessage::CacheUpdate(message), timeout).await {
                    Ok(SyncMessage::Error(e)) => {
                        failed += 1;
                        debug!("{} rejected burst entry: {}", conn.node_name(), e.message);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Burst to {} aborted: {}", conn.node_name(), e);
                        return;
                    }
                }
            }
            info!(
                "Sent {} cached object(s) to {} ({} rejected)",
                total,
                conn.node_name(),
                failed
            );
        });
    }
}

#[async_trait]
impl PeerBroadcaster for TcpTransport {
    async fn send_to_all_peers(&self, message: &SyncMessage) -> SyncResult<BroadcastReport> {
        let peers: Vec<Arc<PeerConnection>> = self.peers.iter().map(|p| Arc::clone(p.value())).collect();
        let results = join_all(
            peers
                .iter()
                .map(|peer| peer.request(message.clone(), self.request_timeout)),
        )
        .await;

        let mut report = BroadcastReport {
            total: peers.len(),
            ..BroadcastReport::default()
        };
        for (peer, result) in peers.iter().zip(results) {
            match result {
                Ok(SyncMessage::Error(e)) => report.failures.push((peer.node_name(), e.message)),
                Ok(_) => report.delivered += 1,
                Err(e) => report.failures.push((peer.node_name(), e.to_string())),
            }
        }
        Ok(report)
    }

    fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
