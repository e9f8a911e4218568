//! Error handling for engine and stream lifecycle operations.
//!
//! Synchronous operations fail fast with an [`EngineError`]; anything that can
//! only be known after asynchronous engine work is reported through the
//! stream's terminal `on_error` callback instead.

mod constructors;
mod types;

pub use constructors::{
    duplicate_name, initialization, lifecycle_order, stale_handle, transport, BoxError,
};
pub use types::{EngineError, Kind, Result, TransportCode};
