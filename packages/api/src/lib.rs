//! Aqueduct Public API
//!
//! Fluent surface over the managed HTTP engine. Configure and start an
//! engine with [`EngineBuilder`], then open streams through
//! [`StreamPrototype`] with per-event closures.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod builder;

pub use builder::*;

// Re-export the client surface so applications need only this crate.
pub use aqueduct_client::{
    filter_factory, key_value_store, register_filter_factory, register_key_value_store,
    register_string_accessor, string_accessor, ConfigBuilder, ConfigError, DataBuffer,
    EngineConfig, EngineError, EngineLogger, EngineSession, EngineState, EngineStatsSnapshot,
    EventExecutor, EventTracker, FilterFactory, InlineExecutor, KeyValueStore, LogLevel,
    NativeFilterConfig, NetworkType, ProxySettings, RequestHeaders, RuntimeExecutor,
    SerialExecutor, StartOptions, Status, StreamCallbacks, StreamFilter, StreamHandle,
    StreamState, StringAccessor, TrustChainVerification,
};

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
pub use bytes::Bytes;
pub use url::Url;

/// Main entry point providing static builder methods.
pub struct Aqueduct;

impl Aqueduct {
    /// Creates a new engine builder with default options.
    ///
    /// Shorthand for `EngineBuilder::new()`.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}
