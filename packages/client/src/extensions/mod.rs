//! Caller-supplied extension points invoked by the engine during stream and
//! configuration processing, keyed by caller-chosen unique names.

mod accessor;
mod filter;
mod kv_store;
mod registry;

pub use accessor::{register_string_accessor, string_accessor, StringAccessor};
pub use filter::{filter_factory, register_filter_factory, FilterFactory, StreamFilter};
pub use kv_store::{key_value_store, register_key_value_store, KeyValueStore};
pub use registry::NamedRegistry;
