//! Platform filter factories: per-stream processing stages created by the
//! engine for every stream whose configuration names them.

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use once_cell::sync::Lazy;

use super::registry::NamedRegistry;
use crate::error::Result;
use crate::stream::RequestHeaders;

/// One filter instance, scoped to one stream. Hooks are invoked from the
/// engine's internal thread, never concurrently for the same instance.
pub trait StreamFilter: Send {
    fn on_request_headers(&mut self, _headers: &RequestHeaders) {}
    fn on_response_headers(&mut self, _status: StatusCode, _headers: &HeaderMap) {}
}

/// Creates a fresh [`StreamFilter`] for each stream. Must be safe to invoke
/// concurrently for independent streams.
pub trait FilterFactory: Send + Sync {
    fn create(&self) -> Box<dyn StreamFilter>;
}

static FILTER_FACTORIES: Lazy<NamedRegistry<dyn FilterFactory>> =
    Lazy::new(|| NamedRegistry::new("filter factory"));

/// Registers a filter factory under a unique name, for reference from a
/// configuration's platform filter chain.
pub fn register_filter_factory(name: &str, factory: Arc<dyn FilterFactory>) -> Result<()> {
    FILTER_FACTORIES.register(name, factory)
}

/// Looks up a registered filter factory.
#[must_use]
pub fn filter_factory(name: &str) -> Option<Arc<dyn FilterFactory>> {
    FILTER_FACTORIES.get(name)
}
