//! Replicated cache lists for SimpleCloud.
//!
//! Every cloud component (the manager, each wrapper, each service plugin)
//! keeps a local copy of the shared state in named cache lists. When a value
//! changes on one node the list applies the change locally, derives domain
//! events against its previous copy and ships the new value to its peers.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **CacheList**: the local store for one value type, with the
//!   update/delete/snapshot operations
//! - **UpdateExecutor**: per-type identity and event derivation rules
//! - **CacheListManager**: registry of lists by name
//! - **ValueTypeRegistry**: maps wire discriminators to decoders
//! - **PacketHandler**: applies received packets to the right list
//! - **Transport**: `PeerBroadcaster` plus a TCP implementation in `net`
//! - **CloudContext**: wires all of the above for one node
//!
//! ## Sync Process
//!
//! 1. **Handshake**: peers exchange `Hello`/`HelloAck` and protocol version
//! 2. **Burst**: the accepting side sends every cached value to the new peer
//! 3. **Update**: each local change is broadcast as one `CacheUpdate`
//! 4. **Apply**: receivers replay it with `from_packet` set, which never
//!    re-broadcasts
//!
//! # Example
//!
//! ```
//! use simplecloud_sync::{CloudContext, NoopBroadcaster, SyncConfig};
//! use std::sync::Arc;
//!
//! let context = CloudContext::builder(SyncConfig::default())
//!     .broadcaster(Arc::new(NoopBroadcaster))
//!     .build()
//!     .unwrap();
//! assert_eq!(context.lists().len(), 5);
//! ```

mod cache_list;
pub mod config;
mod context;
pub mod domain;
mod error;
pub mod events;
mod executor;
mod handler;
pub mod net;
pub mod persistence;
pub mod protocol;
mod registry;
mod store;
pub mod transport;
mod value_types;

pub use cache_list::{CacheList, CacheListConfig, ErasedCacheList, ManagedCacheList};
pub use config::{NodeRole, SyncConfig};
pub use context::{CloudContext, CloudContextBuilder};
pub use error::{SyncError, SyncResult};
pub use events::{EventBus, EventEnvelope};
pub use executor::UpdateExecutor;
pub use handler::PacketHandler;
pub use protocol::{CacheUpdateMessage, SyncAction, SyncMessage};
pub use registry::CacheListManager;
pub use store::{CacheStore, Snapshot};
pub use transport::{BroadcastReport, NoopBroadcaster, PeerBroadcaster};
pub use value_types::ValueTypeRegistry;
