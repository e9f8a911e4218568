//! Caller-supplied capability interfaces and the per-stream callback bundle.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::EngineError;

/// Log severity for engine-internal log lines forwarded to the caller.
///
/// The string form matches the log-level argument accepted by the engine
/// startup entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
    Off,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Off => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives engine log lines on behalf of the caller.
///
/// Invoked from engine-internal threads; implementations must be safe to call
/// concurrently.
pub trait EngineLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Receives engine lifecycle events as flat string maps.
pub trait EventTracker: Send + Sync {
    fn track(&self, event: &HashMap<String, String>);
}

/// One-shot completion callback fired after the engine finishes its startup
/// sequence and begins running.
pub type OnEngineRunning = Box<dyn FnOnce() + Send>;

/// The per-stream bundle of caller-supplied callbacks.
///
/// Every field is optional; unset callbacks drop their events. All callbacks
/// run on the [`EventExecutor`](super::EventExecutor) bound to the stream at
/// start time and are never invoked after the stream's terminal event.
#[derive(Default)]
pub struct StreamCallbacks {
    /// Response headers, with the response status and whether the response is
    /// headers-only.
    pub on_headers: Option<Box<dyn Fn(StatusCode, HeaderMap, bool) + Send + Sync>>,
    /// A chunk of response data, with an end-of-body flag.
    pub on_data: Option<Box<dyn Fn(Bytes, bool) + Send + Sync>>,
    /// Response trailers.
    pub on_trailers: Option<Box<dyn Fn(HeaderMap) + Send + Sync>>,
    /// Terminal: the exchange finished successfully.
    pub on_complete: Option<Box<dyn Fn() + Send + Sync>>,
    /// Terminal: the exchange failed with a transport error.
    pub on_error: Option<Box<dyn Fn(EngineError) + Send + Sync>>,
    /// Terminal: the stream was cancelled, locally or by the engine.
    pub on_cancel: Option<Box<dyn Fn() + Send + Sync>>,
}

impl StreamCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_headers", &self.on_headers.is_some())
            .field("on_data", &self.on_data.is_some())
            .field("on_trailers", &self.on_trailers.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}
