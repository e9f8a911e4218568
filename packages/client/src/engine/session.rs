//! The session that owns one running engine handle.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{unbounded, Sender};
use dashmap::DashMap;

use super::core::{EngineCommand, EngineWorker};
use super::network::{NetworkType, ProxySettings, Status};
use super::registry;
use super::stats::{EngineStats, EngineStatsSnapshot};
use crate::callbacks::{
    CallbackDispatcher, EngineLogger, EventExecutor, EventTracker, InlineExecutor, LogLevel,
    OnEngineRunning,
};
use crate::config::EngineConfig;
use crate::error::{self, Result};
use crate::extensions::{self, FilterFactory};
use crate::stream::{StreamHandle, StreamInner};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

const STARTING: u8 = 0;
const RUNNING: u8 = 1;
const TERMINATED: u8 = 2;

/// Engine lifecycle state as observed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Starting,
    Running,
    Terminated,
}

/// State shared between the session handle and the engine worker.
pub(crate) struct EngineShared {
    lifecycle: AtomicU8,
    pub(crate) stats: EngineStats,
    pub(crate) streams: DashMap<u64, Arc<StreamInner>>,
    preferred_network: Mutex<Option<NetworkType>>,
    proxy: Mutex<Option<ProxySettings>>,
}

impl EngineShared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            lifecycle: AtomicU8::new(STARTING),
            stats: EngineStats::new(),
            streams: DashMap::new(),
            preferred_network: Mutex::new(None),
            proxy: Mutex::new(None),
        })
    }

    fn state(&self) -> EngineState {
        match self.lifecycle.load(Ordering::Acquire) {
            STARTING => EngineState::Starting,
            RUNNING => EngineState::Running,
            _ => EngineState::Terminated,
        }
    }

    /// Starting → Running; false when terminate won the race.
    pub(crate) fn mark_running(&self) -> bool {
        self.lifecycle
            .compare_exchange(STARTING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Options accepted by [`EngineSession::start`] beyond the configuration.
pub struct StartOptions {
    /// Fires exactly once, asynchronously, after the engine finishes its
    /// startup sequence.
    pub on_engine_running: Option<OnEngineRunning>,
    pub logger: Option<Arc<dyn EngineLogger>>,
    pub event_tracker: Option<Arc<dyn EventTracker>>,
    pub log_level: LogLevel,
    /// Execution context for engine-level callbacks (`on_engine_running`).
    pub executor: Arc<dyn EventExecutor>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            on_engine_running: None,
            logger: None,
            event_tracker: None,
            log_level: LogLevel::Info,
            executor: Arc::new(InlineExecutor),
        }
    }
}

impl std::fmt::Debug for StartOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartOptions")
            .field("on_engine_running", &self.on_engine_running.is_some())
            .field("logger", &self.logger.is_some())
            .field("event_tracker", &self.event_tracker.is_some())
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Owns one running engine instance and the set of live streams it created.
pub struct EngineSession {
    id: u64,
    config: EngineConfig,
    shared: Arc<EngineShared>,
    commands: Sender<EngineCommand>,
    dispatcher: Arc<CallbackDispatcher>,
    engine_executor: Arc<dyn EventExecutor>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    next_stream_id: AtomicU64,
    created_at: Instant,
}

impl EngineSession {
    /// Starts the engine and brings it to Running asynchronously.
    ///
    /// Ensures engine support is loaded (at most once per process) and claims
    /// the single live-engine slot. Starting a second engine while one is
    /// live fails deterministically with a lifecycle-order error; the
    /// existing session is never returned to a different caller.
    pub fn start(config: EngineConfig, options: StartOptions) -> Result<Arc<EngineSession>> {
        registry::load()?;

        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        registry::claim_engine(id)?;

        let filter_factories = match resolve_filter_chain(&config) {
            Ok(factories) => factories,
            Err(e) => {
                registry::release_engine(id);
                return Err(e);
            }
        };

        let (commands, command_rx) = unbounded();
        let shared = EngineShared::new();
        let dispatcher = CallbackDispatcher::new();

        let worker = EngineWorker::new(
            command_rx,
            dispatcher.clone(),
            shared.clone(),
            options.executor.clone(),
            options.on_engine_running,
            options.logger,
            options.event_tracker,
            options.log_level,
            filter_factories,
        );
        let spawned = thread::Builder::new()
            .name(format!("aqueduct-engine-{id}"))
            .spawn(move || worker.run());
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                registry::release_engine(id);
                return Err(error::initialization(e));
            }
        };

        tracing::debug!(engine = id, "engine starting");
        Ok(Arc::new(EngineSession {
            id,
            config,
            shared,
            commands,
            dispatcher,
            engine_executor: options.executor,
            worker: Mutex::new(Some(handle)),
            next_stream_id: AtomicU64::new(1),
            created_at: Instant::now(),
        }))
    }

    /// The process-unique engine identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The immutable configuration this engine was started with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Engine uptime since `start`.
    #[inline]
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Number of live (non-terminal) streams owned by this engine.
    #[must_use]
    pub fn live_streams(&self) -> usize {
        self.shared.streams.len()
    }

    /// Allocates a stream handle scoped to this engine.
    ///
    /// The stream must be started before any other interaction.
    pub fn init_stream(&self) -> Result<StreamHandle> {
        if self.state() == EngineState::Terminated {
            return Err(error::lifecycle_order("engine is terminated"));
        }
        let stream_id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let inner = StreamInner::new(stream_id, self.commands.clone(), self.dispatcher.clone());
        self.shared.streams.insert(stream_id, inner.clone());
        Ok(StreamHandle::new(inner))
    }

    /// Transitions Running → Terminated.
    ///
    /// Forces every still-live stream into a terminal Reset (visible to the
    /// caller as an `on_cancel` for each) before the engine handle is
    /// released; all of those terminal callbacks land before this returns.
    /// Idempotent: terminating an already-terminated engine is a no-op.
    pub fn terminate(&self) {
        let previous = self.shared.lifecycle.swap(TERMINATED, Ordering::AcqRel);
        if previous == TERMINATED {
            return;
        }

        // Grab every live stream's executor before the worker detaches them,
        // so the terminal cancels can be flushed through.
        let executors: Vec<Arc<dyn EventExecutor>> = self
            .shared
            .streams
            .iter()
            .filter_map(|entry| entry.value().context_executor())
            .collect();

        let _ = self.commands.send(EngineCommand::Terminate);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        for executor in executors {
            executor.flush();
        }
        self.engine_executor.flush();

        registry::release_engine(self.id);
        tracing::info!(engine = self.id, "engine terminated");
    }

    /// Increments the counter stat identified by `elements` and `tags`.
    ///
    /// Reports `Failure` without side effects on a non-Running engine; stat
    /// operations must never crash a caller racing engine shutdown.
    pub fn record_counter_inc(
        &self,
        elements: &str,
        tags: &[(String, String)],
        count: u64,
    ) -> Status {
        if !self.is_running() {
            return Status::Failure;
        }
        self.shared.stats.record_counter(elements, tags, count);
        Status::Ok
    }

    /// Requests a stat-sink flush outside the flushing interval.
    /// Asynchronous; never blocks.
    pub fn flush_stats(&self) -> Status {
        if !self.is_running() {
            return Status::Failure;
        }
        tracing::debug!(engine = self.id, "stats flush requested");
        Status::Ok
    }

    /// Renders the value of all active stats.
    ///
    /// May block for a bounded time while the snapshot is gathered. Returns
    /// an empty string on a non-Running engine.
    #[must_use]
    pub fn dump_stats(&self) -> String {
        if !self.is_running() {
            return String::new();
        }
        self.shared.stats.dump()
    }

    /// Point-in-time copy of this engine's counters.
    #[must_use]
    pub fn stats_snapshot(&self) -> EngineStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Refreshes DNS and drains connections owned by this engine.
    /// Best-effort; returns after issuing the request.
    pub fn reset_connectivity_state(&self) -> Status {
        if self.state() == EngineState::Terminated {
            return Status::Failure;
        }
        tracing::debug!(engine = self.id, "connectivity state reset requested");
        Status::Ok
    }

    /// Prefers `network` for new streams. Best-effort.
    pub fn set_preferred_network(&self, network: NetworkType) -> Status {
        if self.state() == EngineState::Terminated {
            return Status::Failure;
        }
        *self
            .shared
            .preferred_network
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(network);
        Status::Ok
    }

    /// Updates the engine-wide proxy settings. Best-effort.
    pub fn set_proxy_settings(&self, host: &str, port: u16) -> Status {
        if self.state() == EngineState::Terminated {
            return Status::Failure;
        }
        *self
            .shared
            .proxy
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(ProxySettings::new(host, port));
        Status::Ok
    }

    /// The currently preferred network, if one was set.
    #[must_use]
    pub fn preferred_network(&self) -> Option<NetworkType> {
        *self
            .shared
            .preferred_network
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The current proxy settings, if any.
    #[must_use]
    pub fn proxy_settings(&self) -> Option<ProxySettings> {
        self.shared
            .proxy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("live_streams", &self.live_streams())
            .finish_non_exhaustive()
    }
}

fn resolve_filter_chain(config: &EngineConfig) -> Result<Vec<(String, Arc<dyn FilterFactory>)>> {
    let mut factories = Vec::with_capacity(config.platform_filter_chain.len());
    for name in &config.platform_filter_chain {
        match extensions::filter_factory(name) {
            Some(factory) => factories.push((name.clone(), factory)),
            None => {
                return Err(error::initialization(format!(
                    "platform filter {name:?} is not registered"
                )))
            }
        }
    }
    Ok(factories)
}
