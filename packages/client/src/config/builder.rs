//! Builder for [`EngineConfig`].

use super::types::{EngineConfig, NativeFilterConfig, TrustChainVerification};
use super::validation::{self, ConfigError};

/// Accumulates engine options and produces one validated, immutable
/// [`EngineConfig`] on [`build`](Self::build).
///
/// Every option has a default (see the `Default` impl); cross-field
/// constraints are checked only at build time, so a partially-configured
/// builder can never reach the engine.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    pub(super) connect_timeout_seconds: u64,
    pub(super) dns_refresh_seconds: u64,
    pub(super) dns_failure_refresh_seconds_base: u64,
    pub(super) dns_failure_refresh_seconds_max: u64,
    pub(super) dns_query_timeout_seconds: u64,
    pub(super) dns_min_refresh_seconds: u64,
    pub(super) dns_preresolve_hostnames: Vec<String>,
    pub(super) enable_dns_cache: bool,
    pub(super) dns_cache_save_interval_seconds: u64,
    pub(super) enable_drain_post_dns_refresh: bool,
    pub(super) enable_http3: bool,
    pub(super) enable_gzip: bool,
    pub(super) enable_brotli: bool,
    pub(super) enable_socket_tagging: bool,
    pub(super) enable_happy_eyeballs: bool,
    pub(super) enable_interface_binding: bool,
    pub(super) h2_connection_keepalive_idle_interval_milliseconds: u64,
    pub(super) h2_connection_keepalive_timeout_seconds: u64,
    pub(super) max_connections_per_host: u32,
    pub(super) stats_flush_seconds: u64,
    pub(super) stream_idle_timeout_seconds: u64,
    pub(super) per_try_idle_timeout_seconds: u64,
    pub(super) app_version: String,
    pub(super) app_id: String,
    pub(super) trust_chain_verification: TrustChainVerification,
    pub(super) virtual_clusters: Vec<String>,
    pub(super) platform_filter_chain: Vec<String>,
    pub(super) native_filter_chain: Vec<NativeFilterConfig>,
    pub(super) stat_sinks: Vec<String>,
    pub(super) grpc_stats_domain: Option<String>,
    pub(super) admin_interface_enabled: bool,
    pub(super) enable_skip_dns_lookup_for_proxied_requests: bool,
    pub(super) enable_platform_certificates_validation: bool,
    pub(super) testing: bool,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection establishment timeout.
    pub fn with_connect_timeout_seconds(mut self, seconds: u64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    /// Interval between DNS refreshes.
    pub fn with_dns_refresh_seconds(mut self, seconds: u64) -> Self {
        self.dns_refresh_seconds = seconds;
        self
    }

    /// DNS refresh backoff after failures: base and cap of the exponential
    /// retry interval.
    pub fn with_dns_failure_refresh_seconds(mut self, base: u64, max: u64) -> Self {
        self.dns_failure_refresh_seconds_base = base;
        self.dns_failure_refresh_seconds_max = max;
        self
    }

    /// DNS query timeout.
    pub fn with_dns_query_timeout_seconds(mut self, seconds: u64) -> Self {
        self.dns_query_timeout_seconds = seconds;
        self
    }

    /// Minimum interval between DNS refreshes.
    pub fn with_dns_min_refresh_seconds(mut self, seconds: u64) -> Self {
        self.dns_min_refresh_seconds = seconds;
        self
    }

    /// Hostnames to resolve before first use.
    pub fn with_dns_preresolve_hostnames(mut self, hostnames: Vec<String>) -> Self {
        self.dns_preresolve_hostnames = hostnames;
        self
    }

    /// Persist DNS resolutions across engine restarts.
    pub fn with_dns_cache(mut self, enabled: bool, save_interval_seconds: u64) -> Self {
        self.enable_dns_cache = enabled;
        self.dns_cache_save_interval_seconds = save_interval_seconds;
        self
    }

    /// Drain connections after a DNS refresh changes resolutions.
    pub fn with_drain_post_dns_refresh(mut self, enabled: bool) -> Self {
        self.enable_drain_post_dns_refresh = enabled;
        self
    }

    /// Enable HTTP/3 (QUIC) for eligible origins.
    pub fn with_http3(mut self, enabled: bool) -> Self {
        self.enable_http3 = enabled;
        self
    }

    /// Enable gzip response decompression.
    pub fn with_gzip(mut self, enabled: bool) -> Self {
        self.enable_gzip = enabled;
        self
    }

    /// Enable brotli response decompression.
    pub fn with_brotli(mut self, enabled: bool) -> Self {
        self.enable_brotli = enabled;
        self
    }

    /// Enable socket tagging for traffic accounting.
    pub fn with_socket_tagging(mut self, enabled: bool) -> Self {
        self.enable_socket_tagging = enabled;
        self
    }

    /// Race IPv4/IPv6 connection attempts.
    pub fn with_happy_eyeballs(mut self, enabled: bool) -> Self {
        self.enable_happy_eyeballs = enabled;
        self
    }

    /// Bind sockets to the preferred network interface.
    pub fn with_interface_binding(mut self, enabled: bool) -> Self {
        self.enable_interface_binding = enabled;
        self
    }

    /// HTTP/2 keepalive ping interval while idle, in milliseconds.
    pub fn with_h2_connection_keepalive_idle_interval_milliseconds(
        mut self,
        milliseconds: u64,
    ) -> Self {
        self.h2_connection_keepalive_idle_interval_milliseconds = milliseconds;
        self
    }

    /// HTTP/2 keepalive ping timeout.
    pub fn with_h2_connection_keepalive_timeout_seconds(mut self, seconds: u64) -> Self {
        self.h2_connection_keepalive_timeout_seconds = seconds;
        self
    }

    /// Per-host connection cap.
    pub fn with_max_connections_per_host(mut self, max: u32) -> Self {
        self.max_connections_per_host = max;
        self
    }

    /// Interval between periodic stat-sink flushes.
    pub fn with_stats_flush_seconds(mut self, seconds: u64) -> Self {
        self.stats_flush_seconds = seconds;
        self
    }

    /// Idle timeout for an established stream.
    pub fn with_stream_idle_timeout_seconds(mut self, seconds: u64) -> Self {
        self.stream_idle_timeout_seconds = seconds;
        self
    }

    /// Idle timeout applied to each retry attempt.
    pub fn with_per_try_idle_timeout_seconds(mut self, seconds: u64) -> Self {
        self.per_try_idle_timeout_seconds = seconds;
        self
    }

    /// Application version reported in stats and headers.
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Application identifier reported in stats and headers.
    pub fn with_app_id(mut self, id: impl Into<String>) -> Self {
        self.app_id = id.into();
        self
    }

    /// Certificate chain validation policy.
    ///
    /// `AcceptUntrusted` is only valid on a builder marked
    /// [`for_testing`](Self::for_testing); `build` rejects it otherwise.
    pub fn with_trust_chain_verification(mut self, mode: TrustChainVerification) -> Self {
        self.trust_chain_verification = mode;
        self
    }

    /// Virtual cluster configuration snippets for stat aggregation.
    pub fn with_virtual_clusters(mut self, clusters: Vec<String>) -> Self {
        self.virtual_clusters = clusters;
        self
    }

    /// Appends a platform filter to the chain, by registered factory name.
    /// Filters run in the order added.
    pub fn add_platform_filter(mut self, name: impl Into<String>) -> Self {
        self.platform_filter_chain.push(name.into());
        self
    }

    /// Appends a native filter to the chain.
    pub fn add_native_filter(mut self, filter: NativeFilterConfig) -> Self {
        self.native_filter_chain.push(filter);
        self
    }

    /// Appends a stat sink endpoint.
    pub fn add_stat_sink(mut self, sink: impl Into<String>) -> Self {
        self.stat_sinks.push(sink.into());
        self
    }

    /// Domain used for gRPC stat reporting.
    pub fn with_grpc_stats_domain(mut self, domain: impl Into<String>) -> Self {
        self.grpc_stats_domain = Some(domain.into());
        self
    }

    /// Expose the local admin interface.
    pub fn with_admin_interface(mut self, enabled: bool) -> Self {
        self.admin_interface_enabled = enabled;
        self
    }

    /// Skip DNS lookups for requests that will be proxied.
    pub fn with_skip_dns_lookup_for_proxied_requests(mut self, enabled: bool) -> Self {
        self.enable_skip_dns_lookup_for_proxied_requests = enabled;
        self
    }

    /// Use platform certificate validation APIs.
    pub fn with_platform_certificates_validation(mut self, enabled: bool) -> Self {
        self.enable_platform_certificates_validation = enabled;
        self
    }

    /// Marks this builder as a testing configuration, unlocking options that
    /// must never reach production (for example `AcceptUntrusted`).
    #[must_use]
    pub fn for_testing(mut self) -> Self {
        self.testing = true;
        self
    }

    /// Validates all cross-field constraints and produces the immutable
    /// configuration.
    ///
    /// No option can change after the returned value is handed to
    /// `EngineSession::start`.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        validation::validate(&self)?;
        Ok(EngineConfig {
            connect_timeout_seconds: self.connect_timeout_seconds,
            dns_refresh_seconds: self.dns_refresh_seconds,
            dns_failure_refresh_seconds_base: self.dns_failure_refresh_seconds_base,
            dns_failure_refresh_seconds_max: self.dns_failure_refresh_seconds_max,
            dns_query_timeout_seconds: self.dns_query_timeout_seconds,
            dns_min_refresh_seconds: self.dns_min_refresh_seconds,
            dns_preresolve_hostnames: self.dns_preresolve_hostnames,
            enable_dns_cache: self.enable_dns_cache,
            dns_cache_save_interval_seconds: self.dns_cache_save_interval_seconds,
            enable_drain_post_dns_refresh: self.enable_drain_post_dns_refresh,
            enable_http3: self.enable_http3,
            enable_gzip: self.enable_gzip,
            enable_brotli: self.enable_brotli,
            enable_socket_tagging: self.enable_socket_tagging,
            enable_happy_eyeballs: self.enable_happy_eyeballs,
            enable_interface_binding: self.enable_interface_binding,
            h2_connection_keepalive_idle_interval_milliseconds: self
                .h2_connection_keepalive_idle_interval_milliseconds,
            h2_connection_keepalive_timeout_seconds: self.h2_connection_keepalive_timeout_seconds,
            max_connections_per_host: self.max_connections_per_host,
            stats_flush_seconds: self.stats_flush_seconds,
            stream_idle_timeout_seconds: self.stream_idle_timeout_seconds,
            per_try_idle_timeout_seconds: self.per_try_idle_timeout_seconds,
            app_version: self.app_version,
            app_id: self.app_id,
            trust_chain_verification: self.trust_chain_verification,
            virtual_clusters: self.virtual_clusters,
            platform_filter_chain: self.platform_filter_chain,
            native_filter_chain: self.native_filter_chain,
            stat_sinks: self.stat_sinks,
            grpc_stats_domain: self.grpc_stats_domain,
            admin_interface_enabled: self.admin_interface_enabled,
            enable_skip_dns_lookup_for_proxied_requests: self
                .enable_skip_dns_lookup_for_proxied_requests,
            enable_platform_certificates_validation: self
                .enable_platform_certificates_validation,
            testing: self.testing,
        })
    }
}
