//! Wire discriminator to decoder mapping.

use crate::error::{SyncError, SyncResult};
use simplecloud_types::CacheValue;
use std::any::Any;
use std::collections::HashMap;

type DecodeFn = fn(&str) -> Result<Box<dyn Any + Send>, serde_json::Error>;

fn decode_boxed<V: CacheValue>(json: &str) -> Result<Box<dyn Any + Send>, serde_json::Error> {
    let value: V = serde_json::from_str(json)?;
    Ok(Box::new(value))
}

/// Decoders for every value type a node can receive.
///
/// Built once at startup and read-only afterwards.
#[derive(Default)]
pub struct ValueTypeRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl ValueTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `V` under [`CacheValue::TYPE_NAME`]. Registering the same
    /// type twice is harmless.
    pub fn register<V: CacheValue>(&mut self) -> &mut Self {
        self.decoders.insert(V::TYPE_NAME, decode_boxed::<V>);
        self
    }

    pub fn contains(&self, value_type: &str) -> bool {
        self.decoders.contains_key(value_type)
    }

    /// Registered discriminators, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.decoders.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Decodes `json` as the type registered under `value_type`.
    pub fn decode(&self, value_type: &str, json: &str) -> SyncResult<Box<dyn Any + Send>> {
        let decode = self
            .decoders
            .get(value_type)
            .ok_or_else(|| SyncError::UnknownType(value_type.to_string()))?;
        decode(json).map_err(|e| SyncError::malformed(value_type, e))
    }
}

impl std::fmt::Debug for ValueTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueTypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplecloud_types::{ServiceGroup, ServiceGroupType, Template};

    #[test]
    fn decodes_registered_type() {
        let mut registry = ValueTypeRegistry::new();
        registry.register::<ServiceGroup>();

        let json = serde_json::to_string(&ServiceGroup::new("Lobby", ServiceGroupType::Lobby)).unwrap();
        let value = registry.decode(ServiceGroup::TYPE_NAME, &json).unwrap();
        let group = value.downcast::<ServiceGroup>().unwrap();
        assert_eq!(group.name, "Lobby");
    }

    #[test]
    fn unknown_discriminator() {
        let registry = ValueTypeRegistry::new();
        let err = registry.decode("nope", "{}").unwrap_err();
        assert!(matches!(err, SyncError::UnknownType(t) if t == "nope"));
    }

    #[test]
    fn bad_payload_is_malformed() {
        let mut registry = ValueTypeRegistry::new();
        registry.register::<Template>();
        let err = registry.decode(Template::TYPE_NAME, "{\"name\": 3}").unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload { .. }));
    }
}
