//! Traits implemented by every value that lives in a cache list.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::time::{SystemTime, UNIX_EPOCH};

/// A value that can be cached, identified and shipped to peers.
///
/// `TYPE_NAME` is the discriminator written next to the JSON payload so the
/// receiving side can pick the right decoder. It must be unique per type and
/// stable across versions.
pub trait CacheValue: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identity of a value inside its list.
    type Key: Clone + Eq + Hash + Display + Debug + Send + Sync + 'static;

    /// Wire discriminator for this type.
    const TYPE_NAME: &'static str;

    /// Returns the identity of this value.
    fn cache_key(&self) -> Self::Key;
}

/// A staged set of changes against a baseline value.
///
/// Unset fields fall back to the baseline; `merge` never mutates the
/// baseline and always returns a complete value.
pub trait Updater {
    /// The value being updated.
    type Value: CacheValue;

    /// The value the changes are staged against.
    fn baseline(&self) -> &Self::Value;

    /// Returns the baseline with all staged changes applied.
    fn merge(&self) -> Self::Value;

    /// Returns true if at least one field is staged.
    fn has_changes(&self) -> bool;
}

/// Milliseconds since the Unix epoch, saturating to zero on a skewed clock.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
