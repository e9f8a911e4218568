use super::types::{EngineError, Kind, TransportCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `EngineError` for a failed library initialization.
pub fn initialization<E: Into<BoxError>>(e: E) -> EngineError {
    EngineError::new(Kind::Initialization).with(e.into())
}

/// Creates an `EngineError` for an operation issued out of lifecycle order.
pub fn lifecycle_order<E: Into<BoxError>>(e: E) -> EngineError {
    EngineError::new(Kind::LifecycleOrder).with(e.into())
}

/// Creates an `EngineError` for an operation against a terminal stream.
pub fn stale_handle(stream_id: u64) -> EngineError {
    EngineError::new(Kind::StaleHandle).with_stream(stream_id)
}

/// Creates an `EngineError` for a registry name conflict.
pub fn duplicate_name(name: &str, registry: &'static str) -> EngineError {
    EngineError::new(Kind::DuplicateName)
        .with(format!("{name:?} is already registered in the {registry} registry"))
}

/// Creates a terminal transport `EngineError`, delivered via `on_error`.
pub fn transport(code: TransportCode, attempt_count: Option<u32>) -> EngineError {
    EngineError::new(Kind::Transport {
        code,
        attempt_count,
    })
}
