//! Executors and managers for the five replicated value types.
//!
//! Each manager owns one [`CacheList`](crate::CacheList) built with its
//! executor and adds the lookups the rest of the cloud needs. Managers are
//! what gets registered, so behaviour they add around `update`/`delete`
//! also applies to packets received from peers.

mod group;
mod player;
mod service;
mod template;
mod wrapper;

pub use group::{GROUP_CACHE, ServiceGroupExecutor, ServiceGroupManager};
pub use player::{CloudPlayerExecutor, CloudPlayerManager, PLAYER_CACHE};
pub use service::{CloudServiceExecutor, CloudServiceManager, SERVICE_CACHE};
pub use template::{TEMPLATE_CACHE, TemplateExecutor, TemplateManager};
pub use wrapper::{WRAPPER_CACHE, WrapperExecutor, WrapperManager};

use crate::error::{SyncError, SyncResult};

/// True if the list kept the change, even if peers did not all receive it.
fn applied_locally(result: &SyncResult<()>) -> bool {
    !matches!(result, Err(SyncError::Serialization(_)))
}
