//! String accessors: named strings the engine pulls from the platform.

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::registry::NamedRegistry;
use crate::error::Result;

/// Supplies a string to the engine on demand.
pub trait StringAccessor: Send + Sync {
    fn get_string(&self) -> String;
}

static STRING_ACCESSORS: Lazy<NamedRegistry<dyn StringAccessor>> =
    Lazy::new(|| NamedRegistry::new("string accessor"));

/// Registers a string accessor under a unique name.
pub fn register_string_accessor(name: &str, accessor: Arc<dyn StringAccessor>) -> Result<()> {
    STRING_ACCESSORS.register(name, accessor)
}

/// Looks up a registered string accessor.
#[must_use]
pub fn string_accessor(name: &str) -> Option<Arc<dyn StringAccessor>> {
    STRING_ACCESSORS.get(name)
}
