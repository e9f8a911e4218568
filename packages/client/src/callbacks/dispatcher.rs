//! Ordered redelivery of engine-originated stream events.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use http::{HeaderMap, StatusCode};

use super::context::CallbackContext;
use crate::error::EngineError;

/// One engine-originated event for a stream.
///
/// For any single stream the engine emits: headers, zero or more data chunks,
/// optional trailers, then exactly one terminal event among complete, error
/// and cancel.
#[derive(Debug)]
pub enum StreamEvent {
    Headers {
        status: StatusCode,
        headers: HeaderMap,
        end_stream: bool,
    },
    Data {
        body: Bytes,
        end_stream: bool,
    },
    Trailers {
        trailers: HeaderMap,
    },
    Complete,
    Error {
        error: EngineError,
    },
    Cancel,
}

impl StreamEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Complete | StreamEvent::Error { .. } | StreamEvent::Cancel
        )
    }
}

/// Receives engine-originated events (on the engine's internal thread) and
/// hands each one to the execution context bound to that stream at creation
/// time.
///
/// Ordering: events for one stream are delivered strictly in emission order;
/// no ordering is guaranteed across distinct streams. All `dispatch` calls
/// for a given stream are already serialized by the engine worker, and every
/// executor is a FIFO serial queue, so per-stream order is preserved end to
/// end. Once a terminal event has been dispatched, later events for that
/// stream are dropped and the dispatcher's reference to the context is
/// released.
pub struct CallbackDispatcher {
    contexts: DashMap<u64, Arc<CallbackContext>>,
}

impl CallbackDispatcher {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            contexts: DashMap::new(),
        })
    }

    /// Binds a stream to its callback context. Called once, at stream start.
    pub fn attach(&self, stream_id: u64, context: Arc<CallbackContext>) {
        self.contexts.insert(stream_id, context);
    }

    /// Delivers one event for `stream_id` on its bound executor.
    ///
    /// Events for unknown or already-terminal streams are dropped.
    pub fn dispatch(&self, stream_id: u64, event: StreamEvent) {
        let Some(context) = self.contexts.get(&stream_id).map(|e| e.value().clone()) else {
            tracing::trace!(stream_id, "dropping event for detached stream");
            return;
        };

        if event.is_terminal() {
            if !context.mark_terminal() {
                // A terminal event already went out for this stream.
                return;
            }
            self.contexts.remove(&stream_id);
        } else if context.is_terminal() {
            return;
        }

        let delivery = context.clone();
        context
            .executor()
            .execute(Box::new(move || delivery.deliver(event)));
    }

    /// Drops a stream's context without delivering anything.
    pub(crate) fn detach(&self, stream_id: u64) {
        self.contexts.remove(&stream_id);
    }

    /// Number of streams with live callback contexts.
    #[must_use]
    pub fn attached(&self) -> usize {
        self.contexts.len()
    }
}
