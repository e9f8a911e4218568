//! Fluent engine construction.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use aqueduct_client::{
    ConfigBuilder, ConfigError, EngineError, EngineLogger, EngineSession, EventExecutor,
    EventTracker, LogLevel, NativeFilterConfig, StartOptions, TrustChainVerification,
};

use super::stream::StreamPrototype;

/// Errors surfaced by [`EngineBuilder::build`]: either the configuration
/// failed validation or the engine failed to start.
#[derive(Debug)]
pub enum BuildError {
    Config(ConfigError),
    Engine(EngineError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(err) => write!(f, "invalid configuration: {err}"),
            BuildError::Engine(err) => write!(f, "engine failed to start: {err}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Config(err) => Some(err),
            BuildError::Engine(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BuildError {
    fn from(err: ConfigError) -> Self {
        BuildError::Config(err)
    }
}

impl From<EngineError> for BuildError {
    fn from(err: EngineError) -> Self {
        BuildError::Engine(err)
    }
}

/// Builds and starts an engine in one fluent chain.
///
/// Wraps [`ConfigBuilder`] for the immutable configuration and
/// [`StartOptions`] for the runtime hooks, so a complete engine reads as a
/// single expression:
///
/// ```rust,no_run
/// use aqueduct::Aqueduct;
///
/// let engine = Aqueduct::builder()
///     .connect_timeout_seconds(10)
///     .app_id("demo")
///     .on_engine_running(|| println!("up"))
///     .build()
///     .expect("engine starts");
/// # drop(engine);
/// ```
pub struct EngineBuilder {
    config: ConfigBuilder,
    options: StartOptions,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ConfigBuilder::new(),
            options: StartOptions::default(),
        }
    }

    pub fn connect_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config = self.config.with_connect_timeout_seconds(seconds);
        self
    }

    pub fn dns_refresh_seconds(mut self, seconds: u64) -> Self {
        self.config = self.config.with_dns_refresh_seconds(seconds);
        self
    }

    pub fn dns_failure_refresh_seconds(mut self, base: u64, max: u64) -> Self {
        self.config = self.config.with_dns_failure_refresh_seconds(base, max);
        self
    }

    pub fn dns_query_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config = self.config.with_dns_query_timeout_seconds(seconds);
        self
    }

    pub fn dns_min_refresh_seconds(mut self, seconds: u64) -> Self {
        self.config = self.config.with_dns_min_refresh_seconds(seconds);
        self
    }

    pub fn dns_preresolve_hostnames(mut self, hostnames: Vec<String>) -> Self {
        self.config = self.config.with_dns_preresolve_hostnames(hostnames);
        self
    }

    pub fn http3(mut self, enabled: bool) -> Self {
        self.config = self.config.with_http3(enabled);
        self
    }

    pub fn gzip(mut self, enabled: bool) -> Self {
        self.config = self.config.with_gzip(enabled);
        self
    }

    pub fn brotli(mut self, enabled: bool) -> Self {
        self.config = self.config.with_brotli(enabled);
        self
    }

    pub fn max_connections_per_host(mut self, max: u32) -> Self {
        self.config = self.config.with_max_connections_per_host(max);
        self
    }

    pub fn stream_idle_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config = self.config.with_stream_idle_timeout_seconds(seconds);
        self
    }

    pub fn per_try_idle_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config = self.config.with_per_try_idle_timeout_seconds(seconds);
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config = self.config.with_app_version(version);
        self
    }

    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.config = self.config.with_app_id(id);
        self
    }

    pub fn trust_chain_verification(mut self, mode: TrustChainVerification) -> Self {
        self.config = self.config.with_trust_chain_verification(mode);
        self
    }

    pub fn platform_filter(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.add_platform_filter(name);
        self
    }

    pub fn native_filter(mut self, filter: NativeFilterConfig) -> Self {
        self.config = self.config.add_native_filter(filter);
        self
    }

    pub fn stat_sink(mut self, sink: impl Into<String>) -> Self {
        self.config = self.config.add_stat_sink(sink);
        self
    }

    /// Marks the configuration as test-only, unlocking restricted options.
    #[must_use]
    pub fn for_testing(mut self) -> Self {
        self.config = self.config.for_testing();
        self
    }

    /// Applies any remaining [`ConfigBuilder`] option not surfaced here.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(ConfigBuilder) -> ConfigBuilder) -> Self {
        self.config = f(self.config);
        self
    }

    /// Invoked exactly once when the engine reaches its running state.
    pub fn on_engine_running(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.options.on_engine_running = Some(Box::new(callback));
        self
    }

    pub fn logger(mut self, logger: Arc<dyn EngineLogger>) -> Self {
        self.options.logger = Some(logger);
        self
    }

    pub fn event_tracker(mut self, tracker: Arc<dyn EventTracker>) -> Self {
        self.options.event_tracker = Some(tracker);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.options.log_level = level;
        self
    }

    /// Executor on which engine-level callbacks run. Stream callbacks use
    /// the executor given per stream.
    pub fn executor(mut self, executor: Arc<dyn EventExecutor>) -> Self {
        self.options.executor = executor;
        self
    }

    /// Validates the configuration and starts the engine.
    pub fn build(self) -> Result<Engine, BuildError> {
        let config = self.config.build()?;
        let session = EngineSession::start(config, self.options)?;
        tracing::debug!(engine = session.id(), "engine built through fluent surface");
        Ok(Engine { session })
    }
}

/// A running engine. Derefs to [`EngineSession`] for lifecycle, stats, and
/// connectivity operations.
#[derive(Clone)]
pub struct Engine {
    session: Arc<EngineSession>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("session", &self.session.id())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Begins configuring a new stream on this engine.
    #[must_use]
    pub fn new_stream(&self) -> StreamPrototype {
        StreamPrototype::new(self.session.clone())
    }

    #[must_use]
    pub fn session(&self) -> &Arc<EngineSession> {
        &self.session
    }
}

impl Deref for Engine {
    type Target = EngineSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}
