//! Callback dispatch: the machinery that takes engine-originated events from
//! the engine's internal thread and redelivers them, in order, on the
//! execution context the caller registered for each stream.

mod context;
mod dispatcher;
mod executor;
mod types;

pub use context::CallbackContext;
pub use dispatcher::{CallbackDispatcher, StreamEvent};
pub use executor::{EventExecutor, InlineExecutor, RuntimeExecutor, SerialExecutor, Task};
pub use types::{EngineLogger, EventTracker, LogLevel, OnEngineRunning, StreamCallbacks};
