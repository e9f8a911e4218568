//! The engine's internal worker.
//!
//! This is the serialization point behind the engine's function surface:
//! every caller operation arrives as a command on one channel, and every
//! stream event the engine originates is emitted from this single loop, which
//! is what makes per-stream event ordering total. The transport itself is a
//! local echo core; the real proxying engine sits behind the same surface
//! and is deliberately out of scope here.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_channel::Receiver;
use http::{HeaderMap, HeaderValue, StatusCode};

use super::session::EngineShared;
use crate::callbacks::{
    CallbackDispatcher, EngineLogger, EventExecutor, EventTracker, LogLevel, OnEngineRunning,
    StreamEvent,
};
use crate::extensions::{FilterFactory, StreamFilter};
use crate::stream::{RequestHeaders, StreamInner};

fn log_facade_level(level: LogLevel) -> Option<log::Level> {
    match level {
        LogLevel::Trace => Some(log::Level::Trace),
        LogLevel::Debug => Some(log::Level::Debug),
        LogLevel::Info => Some(log::Level::Info),
        LogLevel::Warn => Some(log::Level::Warn),
        LogLevel::Error | LogLevel::Critical => Some(log::Level::Error),
        LogLevel::Off => None,
    }
}

/// Caller operations forwarded to the worker.
pub(crate) enum EngineCommand {
    StartStream {
        stream: u64,
        inner: Arc<StreamInner>,
        explicit_flow_control: bool,
    },
    SendHeaders {
        stream: u64,
        headers: RequestHeaders,
        end_stream: bool,
    },
    SendData {
        stream: u64,
        body: Bytes,
        end_stream: bool,
    },
    SendTrailers {
        stream: u64,
        trailers: HeaderMap,
    },
    ReadData {
        stream: u64,
        byte_count: u64,
    },
    ResetStream {
        stream: u64,
    },
    Terminate,
}

/// Engine-side record for one live stream.
struct StreamRecord {
    inner: Arc<StreamInner>,
    explicit_flow_control: bool,
    filters: Vec<Box<dyn StreamFilter>>,
    request_chunks: Vec<Bytes>,
    request_closed: bool,
    response_headers_sent: bool,
    /// Response data not yet delivered to the caller.
    pending: VecDeque<Bytes>,
    /// One-shot read budget; present only between a `read_data` grant and
    /// the delivery that consumes it.
    budget: Option<u64>,
    /// The response is fully buffered; `on_complete` follows the last chunk.
    complete_pending: bool,
}

pub(crate) struct EngineWorker {
    commands: Receiver<EngineCommand>,
    dispatcher: Arc<CallbackDispatcher>,
    shared: Arc<EngineShared>,
    engine_executor: Arc<dyn EventExecutor>,
    on_running: Option<OnEngineRunning>,
    logger: Option<Arc<dyn EngineLogger>>,
    event_tracker: Option<Arc<dyn EventTracker>>,
    log_level: LogLevel,
    filter_factories: Vec<(String, Arc<dyn FilterFactory>)>,
    streams: HashMap<u64, StreamRecord>,
}

impl EngineWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        commands: Receiver<EngineCommand>,
        dispatcher: Arc<CallbackDispatcher>,
        shared: Arc<EngineShared>,
        engine_executor: Arc<dyn EventExecutor>,
        on_running: Option<OnEngineRunning>,
        logger: Option<Arc<dyn EngineLogger>>,
        event_tracker: Option<Arc<dyn EventTracker>>,
        log_level: LogLevel,
        filter_factories: Vec<(String, Arc<dyn FilterFactory>)>,
    ) -> Self {
        Self {
            commands,
            dispatcher,
            shared,
            engine_executor,
            on_running,
            logger,
            event_tracker,
            log_level,
            filter_factories,
            streams: HashMap::new(),
        }
    }

    pub(crate) fn run(mut self) {
        // When terminate wins the startup race the Running transition (and
        // its callback) is skipped, but the command loop still runs: the
        // already-queued Terminate command drives the cancel-all path for
        // any streams started in that window.
        if self.shared.mark_running() {
            self.log(LogLevel::Info, "engine finished startup and is running");
            self.track("engine_running");
            if let Some(on_running) = self.on_running.take() {
                self.engine_executor.execute(Box::new(on_running));
            }
        }

        while let Ok(command) = self.commands.recv() {
            match command {
                EngineCommand::StartStream {
                    stream,
                    inner,
                    explicit_flow_control,
                } => self.start_stream(stream, inner, explicit_flow_control),
                EngineCommand::SendHeaders {
                    stream,
                    headers,
                    end_stream,
                } => self.send_headers(stream, headers, end_stream),
                EngineCommand::SendData {
                    stream,
                    body,
                    end_stream,
                } => self.send_data(stream, body, end_stream),
                EngineCommand::SendTrailers { stream, trailers } => {
                    self.send_trailers(stream, trailers);
                }
                EngineCommand::ReadData { stream, byte_count } => {
                    self.read_data(stream, byte_count);
                }
                EngineCommand::ResetStream { stream } => self.reset_stream(stream),
                EngineCommand::Terminate => {
                    self.terminate();
                    break;
                }
            }
        }
        tracing::debug!("engine worker exited");
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level < self.log_level {
            return;
        }
        match &self.logger {
            Some(logger) => logger.log(level, message),
            None => {
                if let Some(level) = log_facade_level(level) {
                    log::log!(level, "{message}");
                }
            }
        }
    }

    fn track(&self, name: &str) {
        if let Some(tracker) = &self.event_tracker {
            let mut event = HashMap::new();
            event.insert("name".to_string(), name.to_string());
            tracker.track(&event);
        }
    }

    fn start_stream(&mut self, stream: u64, inner: Arc<StreamInner>, explicit_flow_control: bool) {
        let filters = self
            .filter_factories
            .iter()
            .map(|(_, factory)| factory.create())
            .collect();
        self.streams.insert(
            stream,
            StreamRecord {
                inner,
                explicit_flow_control,
                filters,
                request_chunks: Vec::new(),
                request_closed: false,
                response_headers_sent: false,
                pending: VecDeque::new(),
                budget: None,
                complete_pending: false,
            },
        );
        self.shared.stats.streams_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(stream, explicit_flow_control, "stream started");
    }

    fn send_headers(&mut self, stream: u64, headers: RequestHeaders, end_stream: bool) {
        let Some(record) = self.streams.get_mut(&stream) else {
            return;
        };
        for filter in &mut record.filters {
            filter.on_request_headers(&headers);
        }
        if end_stream {
            self.finish_request(stream);
        }
    }

    fn send_data(&mut self, stream: u64, body: Bytes, end_stream: bool) {
        let Some(record) = self.streams.get_mut(&stream) else {
            return;
        };
        self.shared
            .stats
            .bytes_sent
            .fetch_add(body.len() as u64, Ordering::Relaxed);
        record.request_chunks.push(body);
        if end_stream {
            self.finish_request(stream);
        }
    }

    fn send_trailers(&mut self, stream: u64, _trailers: HeaderMap) {
        if self.streams.contains_key(&stream) {
            self.finish_request(stream);
        }
    }

    /// The request is fully sent: synthesize the response. The echo core
    /// answers 200 with the request body mirrored back.
    fn finish_request(&mut self, stream: u64) {
        let headers_event = {
            let Some(record) = self.streams.get_mut(&stream) else {
                return;
            };
            if record.request_closed {
                return;
            }
            record.request_closed = true;

            for chunk in record.request_chunks.drain(..).collect::<Vec<_>>() {
                if !chunk.is_empty() {
                    record.pending.push_back(chunk);
                }
            }
            record.complete_pending = true;
            record.response_headers_sent = true;

            let mut headers = HeaderMap::new();
            headers.insert("server", HeaderValue::from_static("aqueduct"));
            let status = StatusCode::OK;
            for filter in &mut record.filters {
                filter.on_response_headers(status, &headers);
            }
            let event = StreamEvent::Headers {
                status,
                headers,
                end_stream: record.pending.is_empty(),
            };
            if record.inner.apply_engine_event(&event) {
                Some(event)
            } else {
                None
            }
        };
        if let Some(event) = headers_event {
            self.dispatcher.dispatch(stream, event);
        }
        self.deliver_response(stream);
    }

    fn read_data(&mut self, stream: u64, byte_count: u64) {
        let Some(record) = self.streams.get_mut(&stream) else {
            return;
        };
        // One-shot grant: a new call replaces, not accumulates.
        record.budget = Some(byte_count);
        self.deliver_response(stream);
    }

    /// Pushes buffered response data to the caller, honoring the one-shot
    /// flow budget, then the terminal complete once the body drains.
    fn deliver_response(&mut self, stream: u64) {
        loop {
            enum Step {
                Done,
                Complete,
                Deliver {
                    event: StreamEvent,
                    last: bool,
                    paced: bool,
                },
            }

            let step = {
                let Some(record) = self.streams.get_mut(&stream) else {
                    return;
                };
                if !record.response_headers_sent {
                    Step::Done
                } else if record.pending.is_empty() {
                    if record.complete_pending {
                        Step::Complete
                    } else {
                        Step::Done
                    }
                } else {
                    let chunk = if record.explicit_flow_control {
                        match record.budget.take() {
                            None => None,
                            Some(0) => {
                                // A zero grant delivers nothing; the caller
                                // must ask again.
                                None
                            }
                            Some(budget) => {
                                let budget = usize::try_from(budget).unwrap_or(usize::MAX);
                                record.pending.pop_front().map(|mut front| {
                                    if front.len() > budget {
                                        let rest = front.split_off(budget);
                                        record.pending.push_front(rest);
                                    }
                                    front
                                })
                            }
                        }
                    } else {
                        record.pending.pop_front()
                    };

                    match chunk {
                        None => Step::Done,
                        Some(chunk) => {
                            let last = record.pending.is_empty() && record.complete_pending;
                            self.shared
                                .stats
                                .bytes_received
                                .fetch_add(chunk.len() as u64, Ordering::Relaxed);
                            let event = StreamEvent::Data {
                                body: chunk,
                                end_stream: last,
                            };
                            if record.inner.apply_engine_event(&event) {
                                Step::Deliver {
                                    event,
                                    last,
                                    paced: record.explicit_flow_control,
                                }
                            } else {
                                Step::Done
                            }
                        }
                    }
                }
            };

            match step {
                Step::Done => return,
                Step::Complete => {
                    self.complete_stream(stream, StreamEvent::Complete);
                    return;
                }
                Step::Deliver { event, last, paced } => {
                    self.dispatcher.dispatch(stream, event);
                    if paced {
                        // Each grant covers exactly one delivery.
                        if last {
                            self.complete_stream(stream, StreamEvent::Complete);
                        }
                        return;
                    }
                    if last {
                        self.complete_stream(stream, StreamEvent::Complete);
                        return;
                    }
                }
            }
        }
    }

    fn reset_stream(&mut self, stream: u64) {
        let Some(record) = self.streams.remove(&stream) else {
            return;
        };
        // The caller already latched the Reset state; the dispatcher's
        // terminal latch keeps this from ever following another terminal.
        self.dispatcher.dispatch(stream, StreamEvent::Cancel);
        record.inner.release_context();
        self.shared.streams.remove(&stream);
        self.shared.stats.streams_reset.fetch_add(1, Ordering::Relaxed);
        self.log(LogLevel::Debug, "stream reset by caller");
    }

    /// Applies an engine-originated terminal event. When the caller's reset
    /// won the race instead, the record is kept so the in-flight reset
    /// command can still deliver its cancel.
    fn complete_stream(&mut self, stream: u64, event: StreamEvent) {
        let deliver = {
            let Some(record) = self.streams.get_mut(&stream) else {
                return;
            };
            if record.inner.apply_engine_event(&event) {
                true
            } else {
                record.pending.clear();
                record.complete_pending = false;
                false
            }
        };
        if deliver {
            let errored = matches!(event, StreamEvent::Error { .. });
            self.dispatcher.dispatch(stream, event);
            if let Some(record) = self.streams.remove(&stream) {
                record.inner.release_context();
            }
            self.shared.streams.remove(&stream);
            let counter = if errored {
                &self.shared.stats.streams_errored
            } else {
                &self.shared.stats.streams_completed
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Forces every still-live stream into a terminal Reset before the
    /// engine handle goes away.
    fn terminate(&mut self) {
        let ids: Vec<u64> = self.streams.keys().copied().collect();
        for stream in ids {
            if let Some(record) = self.streams.remove(&stream) {
                if record.inner.apply_engine_event(&StreamEvent::Cancel) {
                    self.dispatcher.dispatch(stream, StreamEvent::Cancel);
                    self.shared.stats.streams_reset.fetch_add(1, Ordering::Relaxed);
                }
                record.inner.release_context();
                self.shared.streams.remove(&stream);
            }
        }
        self.log(LogLevel::Info, "engine terminated");
        self.track("engine_terminated");
    }
}
