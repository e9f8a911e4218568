//! Engine and stream builder modules.
//!
//! Provides the fluent API for configuring an engine and opening streams
//! with elegant method chaining.

pub mod engine;
pub mod stream;

pub use engine::{BuildError, Engine, EngineBuilder};
pub use stream::{request_headers, StreamPrototype};
