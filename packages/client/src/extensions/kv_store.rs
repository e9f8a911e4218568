//! Caller-provided key-value stores, read and written by the engine during
//! stream and configuration processing.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::registry::NamedRegistry;
use crate::error::Result;

/// A platform key-value store. Invoked cross-thread; implementations must be
/// safe to call concurrently for independent streams.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

static KEY_VALUE_STORES: Lazy<NamedRegistry<dyn KeyValueStore>> =
    Lazy::new(|| NamedRegistry::new("key-value store"));

/// Registers a key-value store under a unique name.
pub fn register_key_value_store(name: &str, store: Arc<dyn KeyValueStore>) -> Result<()> {
    KEY_VALUE_STORES.register(name, store)
}

/// Looks up a registered key-value store.
#[must_use]
pub fn key_value_store(name: &str) -> Option<Arc<dyn KeyValueStore>> {
    KEY_VALUE_STORES.get(name)
}
