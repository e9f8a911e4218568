//! Essential types for driving the engine. Everything an application needs
//! to configure, start, and stream lives here.

// Engine lifecycle
pub use crate::engine::registry::{init_count, load, load_test_library};
pub use crate::engine::{
    EngineSession, EngineState, EngineStats, EngineStatsSnapshot, NetworkType, ProxySettings,
    StartOptions, Status,
};

// Configuration
pub use crate::config::{
    ConfigBuilder, ConfigError, EngineConfig, NativeFilterConfig, TrustChainVerification,
};

// Streams
pub use crate::stream::{DataBuffer, RequestHeaders, StreamHandle, StreamState};

// Callbacks and executors
pub use crate::callbacks::{
    EngineLogger, EventExecutor, EventTracker, InlineExecutor, LogLevel, OnEngineRunning,
    RuntimeExecutor, SerialExecutor, StreamCallbacks,
};

// Errors
pub use crate::error::{EngineError, Kind, Result, TransportCode};

// Extension registries
pub use crate::extensions::{
    filter_factory, key_value_store, register_filter_factory, register_key_value_store,
    register_string_accessor, string_accessor, FilterFactory, KeyValueStore, StreamFilter,
    StringAccessor,
};

// HTTP standard types
pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
pub use bytes::Bytes;
