//! Generic name-keyed handler registry.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{self, Result};

/// A name → handler table with first-registration-wins semantics.
///
/// Lookups hand out `Arc` clones, so a stream that began using a handler
/// keeps that same instance even if the name is unregistered mid-flight.
pub struct NamedRegistry<T: ?Sized> {
    entries: DashMap<String, Arc<T>>,
    what: &'static str,
}

impl<T: ?Sized> NamedRegistry<T> {
    #[must_use]
    pub fn new(what: &'static str) -> Self {
        Self {
            entries: DashMap::new(),
            what,
        }
    }

    /// Registers `handler` under `name`. Fails with a duplicate-name error
    /// if the name is taken; the original registration stays active.
    pub fn register(&self, name: &str, handler: Arc<T>) -> Result<()> {
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(error::duplicate_name(name, self.what)),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                tracing::debug!(name, registry = self.what, "handler registered");
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    /// Removes a registration. In-flight users keep their `Arc`. Returns
    /// whether the name was present.
    pub fn unregister(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn value(&self) -> u32;
    }

    struct N(u32);
    impl Named for N {
        fn value(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn duplicate_registration_keeps_the_first() {
        let registry: NamedRegistry<dyn Named> = NamedRegistry::new("test");
        registry.register("a", Arc::new(N(1))).unwrap();
        let err = registry.register("a", Arc::new(N(2))).unwrap_err();
        assert!(err.is_duplicate_name());
        assert_eq!(registry.get("a").unwrap().value(), 1);
    }

    #[test]
    fn in_flight_handler_survives_unregistration() {
        let registry: NamedRegistry<dyn Named> = NamedRegistry::new("test");
        registry.register("a", Arc::new(N(7))).unwrap();
        let held = registry.get("a").unwrap();
        assert!(registry.unregister("a"));
        assert!(registry.get("a").is_none());
        // The instance active when the "stream" started keeps working.
        assert_eq!(held.value(), 7);
    }
}
