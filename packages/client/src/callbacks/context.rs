//! Per-stream callback contexts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::dispatcher::StreamEvent;
use super::executor::EventExecutor;
use super::types::StreamCallbacks;

/// The per-stream bundle of caller callbacks plus the execution context they
/// must run on.
///
/// Shared between the stream handle and the dispatcher; released once the
/// stream reaches a terminal state. The terminal latch guarantees that at
/// most one terminal event is ever delivered and that nothing follows it.
pub struct CallbackContext {
    callbacks: StreamCallbacks,
    executor: Arc<dyn EventExecutor>,
    terminal: AtomicBool,
}

impl CallbackContext {
    #[must_use]
    pub fn new(callbacks: StreamCallbacks, executor: Arc<dyn EventExecutor>) -> Arc<Self> {
        Arc::new(Self {
            callbacks,
            executor,
            terminal: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn executor(&self) -> Arc<dyn EventExecutor> {
        self.executor.clone()
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::Acquire)
    }

    /// Latches the terminal flag; returns false if it was already set.
    pub(crate) fn mark_terminal(&self) -> bool {
        !self.terminal.swap(true, Ordering::AcqRel)
    }

    /// Invokes the caller callback matching `event`. Runs on the bound
    /// executor, never on the engine thread directly (unless the executor is
    /// [`InlineExecutor`](super::InlineExecutor)).
    pub(crate) fn deliver(&self, event: StreamEvent) {
        match event {
            StreamEvent::Headers {
                status,
                headers,
                end_stream,
            } => {
                if let Some(cb) = &self.callbacks.on_headers {
                    cb(status, headers, end_stream);
                }
            }
            StreamEvent::Data { body, end_stream } => {
                if let Some(cb) = &self.callbacks.on_data {
                    cb(body, end_stream);
                }
            }
            StreamEvent::Trailers { trailers } => {
                if let Some(cb) = &self.callbacks.on_trailers {
                    cb(trailers);
                }
            }
            StreamEvent::Complete => {
                if let Some(cb) = &self.callbacks.on_complete {
                    cb();
                }
            }
            StreamEvent::Error { error } => {
                if let Some(cb) = &self.callbacks.on_error {
                    cb(error);
                }
            }
            StreamEvent::Cancel => {
                if let Some(cb) = &self.callbacks.on_cancel {
                    cb();
                }
            }
        }
    }
}

impl std::fmt::Debug for CallbackContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackContext")
            .field("callbacks", &self.callbacks)
            .field("terminal", &self.is_terminal())
            .finish_non_exhaustive()
    }
}
