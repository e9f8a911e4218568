//! The caller-facing stream handle and its state machine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Sender;

use super::buffer::DataBuffer;
use super::headers::RequestHeaders;
use super::state::StreamState;
use crate::callbacks::{
    CallbackContext, CallbackDispatcher, EventExecutor, StreamCallbacks, StreamEvent,
};
use crate::engine::EngineCommand;
use crate::error::{self, Result};

/// Mutable stream state, guarded by the per-stream serialization point.
///
/// Every transition (caller-driven or engine-driven) happens under this lock,
/// so no two threads ever apply a transition concurrently.
#[derive(Debug)]
struct Flags {
    state: StreamState,
    headers_sent: bool,
    trailers_sent: bool,
    local_closed: bool,
    explicit_flow_control: bool,
}

pub(crate) struct StreamInner {
    id: u64,
    flags: Mutex<Flags>,
    context: Mutex<Option<Arc<CallbackContext>>>,
    commands: Sender<EngineCommand>,
    dispatcher: Arc<CallbackDispatcher>,
}

impl StreamInner {
    pub(crate) fn new(
        id: u64,
        commands: Sender<EngineCommand>,
        dispatcher: Arc<CallbackDispatcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            flags: Mutex::new(Flags {
                state: StreamState::Created,
                headers_sent: false,
                trailers_sent: false,
                local_closed: false,
                explicit_flow_control: false,
            }),
            context: Mutex::new(None),
            commands,
            dispatcher,
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> StreamState {
        self.lock().state
    }

    /// Applies an engine-originated transition. Returns false when the stream
    /// already reached a terminal state, in which case the event must be
    /// suppressed (at most one terminal transition ever occurs).
    pub(crate) fn apply_engine_event(&self, event: &StreamEvent) -> bool {
        let mut flags = self.lock();
        if flags.state.is_terminal() {
            return false;
        }
        match event {
            StreamEvent::Headers { .. } => {
                if !flags.local_closed {
                    flags.state = StreamState::HeadersReceived;
                }
            }
            StreamEvent::Data { .. } => {
                if !flags.local_closed {
                    flags.state = StreamState::DataReceiving;
                }
            }
            StreamEvent::Trailers { .. } => {}
            StreamEvent::Complete => flags.state = StreamState::Complete,
            StreamEvent::Error { .. } => flags.state = StreamState::Errored,
            StreamEvent::Cancel => flags.state = StreamState::Reset,
        }
        true
    }

    /// Drops this side's reference to the callback context. Called once the
    /// stream reaches a terminal state.
    pub(crate) fn release_context(&self) {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub(crate) fn context_executor(&self) -> Option<Arc<dyn EventExecutor>> {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.executor())
    }

    fn send_command(&self, command: EngineCommand) -> Result<()> {
        // The channel only disconnects once the engine worker has exited.
        // Streams the worker ever saw were forced terminal by then; a stream
        // rejected here is latched terminal by its caller.
        self.commands
            .send(command)
            .map_err(|_| error::stale_handle(self.id))
    }
}

impl std::fmt::Debug for StreamInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamInner")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// One HTTP request/response exchange against a running engine.
///
/// A stream is exclusively owned by the caller that created it until it
/// reaches a terminal state (`Complete`, `Reset`, `Errored`); after that,
/// every operation fails fast with a stale-handle error and no further
/// callbacks fire.
#[derive(Clone)]
pub struct StreamHandle {
    inner: Arc<StreamInner>,
}

impl StreamHandle {
    pub(crate) fn new(inner: Arc<StreamInner>) -> Self {
        Self { inner }
    }

    /// The engine-scoped stream identity.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        self.inner.state()
    }

    /// Opens the stream, binding its callbacks to `executor`.
    ///
    /// Must be called before any other interaction. When
    /// `explicit_flow_control` is true the engine withholds response data
    /// until the caller grants a budget with [`read_data`](Self::read_data).
    pub fn start(
        &self,
        callbacks: StreamCallbacks,
        executor: Arc<dyn EventExecutor>,
        explicit_flow_control: bool,
    ) -> Result<()> {
        {
            let mut flags = self.inner.lock();
            if flags.state.is_terminal() {
                return Err(error::stale_handle(self.id()));
            }
            if flags.state != StreamState::Created {
                return Err(error::lifecycle_order("stream already started").with_stream(self.id()));
            }
            flags.state = StreamState::Started;
            flags.explicit_flow_control = explicit_flow_control;
        }

        let context = CallbackContext::new(callbacks, executor);
        *self
            .inner
            .context
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(context.clone());
        self.inner.dispatcher.attach(self.id(), context);
        let sent = self.inner.send_command(EngineCommand::StartStream {
            stream: self.id(),
            inner: self.inner.clone(),
            explicit_flow_control,
        });
        if sent.is_err() {
            // The engine is gone and will never cancel this stream, so undo
            // the attach and latch the handle terminal here.
            self.inner.dispatcher.detach(self.id());
            self.inner.release_context();
            self.inner.lock().state = StreamState::Errored;
        }
        sent
    }

    /// Sends the request header block. May be called at most once and must
    /// precede any data or trailers; `end_stream` marks a headers-only
    /// request.
    pub fn send_headers(&self, headers: RequestHeaders, end_stream: bool) -> Result<()> {
        {
            let mut flags = self.inner.lock();
            if flags.state.is_terminal() {
                return Err(error::stale_handle(self.id()));
            }
            if flags.state == StreamState::Created {
                return Err(error::lifecycle_order("stream not started").with_stream(self.id()));
            }
            if flags.headers_sent {
                return Err(
                    error::lifecycle_order("headers already sent").with_stream(self.id())
                );
            }
            flags.headers_sent = true;
            if end_stream {
                flags.local_closed = true;
                flags.state = StreamState::HalfClosedLocal;
            } else {
                flags.state = StreamState::HeadersSent;
            }
        }
        self.inner.send_command(EngineCommand::SendHeaders {
            stream: self.id(),
            headers,
            end_stream,
        })
    }

    /// Sends one request body chunk; repeatable until the send side closes.
    ///
    /// `length` must satisfy `0 <= length <= data.capacity()`.
    pub fn send_data(
        &self,
        data: impl Into<DataBuffer>,
        length: usize,
        end_stream: bool,
    ) -> Result<()> {
        let data = data.into();
        if length > data.capacity() {
            return Err(error::lifecycle_order(format!(
                "data length {length} exceeds buffer capacity {}",
                data.capacity()
            ))
            .with_stream(self.id()));
        }
        let body = data.slice_to(length);
        {
            let mut flags = self.inner.lock();
            if flags.state.is_terminal() {
                return Err(error::stale_handle(self.id()));
            }
            if !flags.headers_sent {
                return Err(
                    error::lifecycle_order("send_data before send_headers").with_stream(self.id())
                );
            }
            if flags.local_closed || flags.trailers_sent {
                return Err(
                    error::lifecycle_order("send side already closed").with_stream(self.id())
                );
            }
            if end_stream {
                flags.local_closed = true;
                flags.state = StreamState::HalfClosedLocal;
            } else if matches!(
                flags.state,
                StreamState::HeadersSent | StreamState::DataInFlight
            ) {
                flags.state = StreamState::DataInFlight;
            }
        }
        self.inner.send_command(EngineCommand::SendData {
            stream: self.id(),
            body,
            end_stream,
        })
    }

    /// Sends the trailer block. May be called at most once and implicitly
    /// ends the caller's send side.
    pub fn send_trailers(&self, trailers: http::HeaderMap) -> Result<()> {
        {
            let mut flags = self.inner.lock();
            if flags.state.is_terminal() {
                return Err(error::stale_handle(self.id()));
            }
            if !flags.headers_sent {
                return Err(error::lifecycle_order("send_trailers before send_headers")
                    .with_stream(self.id()));
            }
            if flags.local_closed || flags.trailers_sent {
                return Err(
                    error::lifecycle_order("send side already closed").with_stream(self.id())
                );
            }
            flags.trailers_sent = true;
            flags.local_closed = true;
            flags.state = StreamState::HalfClosedLocal;
        }
        self.inner.send_command(EngineCommand::SendTrailers {
            stream: self.id(),
            trailers,
        })
    }

    /// Grants a one-shot budget for the next response-data delivery.
    ///
    /// The next data callback passes at most `byte_count` bytes; the grant
    /// does not accumulate, and another call is needed for each further
    /// chunk. A no-op when explicit flow control is disabled. Returns
    /// immediately in either case.
    pub fn read_data(&self, byte_count: u64) -> Result<()> {
        let explicit = {
            let flags = self.inner.lock();
            if flags.state.is_terminal() {
                return Err(error::stale_handle(self.id()));
            }
            if flags.state == StreamState::Created {
                return Err(error::lifecycle_order("stream not started").with_stream(self.id()));
            }
            flags.explicit_flow_control
        };
        if !explicit {
            return Ok(());
        }
        self.inner.send_command(EngineCommand::ReadData {
            stream: self.id(),
            byte_count,
        })
    }

    /// Detaches the stream's callbacks after a final `on_cancel` and requests
    /// an upstream interrupt. Best-effort: bytes already in flight may still
    /// have been transmitted, but the terminal callback is always
    /// `on_cancel`/`on_error`, never a late `on_complete`.
    pub fn reset_stream(&self) -> Result<()> {
        let started = {
            let mut flags = self.inner.lock();
            if flags.state.is_terminal() {
                return Err(error::stale_handle(self.id()));
            }
            let started = flags.state != StreamState::Created;
            flags.state = StreamState::Reset;
            started
        };
        if !started {
            // Never started: no callbacks bound, nothing for the engine to do.
            return Ok(());
        }
        self.inner
            .send_command(EngineCommand::ResetStream { stream: self.id() })
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::InlineExecutor;

    // A start that the engine never accepts must not leave the handle half
    // open: no attached context, and the handle is terminal so later calls
    // fail fast instead of waiting for callbacks that will never come.
    #[test]
    fn rejected_start_leaves_no_dangling_context() {
        let dispatcher = CallbackDispatcher::new();
        let (commands, queue) = crossbeam_channel::unbounded();
        drop(queue);

        let inner = StreamInner::new(3, commands, dispatcher.clone());
        let handle = StreamHandle::new(inner);

        let err = handle
            .start(StreamCallbacks::new(), Arc::new(InlineExecutor), false)
            .expect_err("engine is gone");
        assert!(err.is_stale_handle());

        assert_eq!(dispatcher.attached(), 0);
        assert!(handle.state().is_terminal());
        assert!(handle.inner.context_executor().is_none());

        // The terminal latch holds for everything after the failed start.
        let err = handle
            .start(StreamCallbacks::new(), Arc::new(InlineExecutor), false)
            .expect_err("handle is terminal");
        assert!(err.is_stale_handle());
    }
}
