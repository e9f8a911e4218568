//! The immutable engine configuration value.

use serde::Serialize;

/// Policy controlling how certificate chains are validated for outbound
/// connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrustChainVerification {
    /// Validate the full trust chain (the default).
    Verify,
    /// Accept untrusted chains. Only valid for testing configurations.
    AcceptUntrusted,
    /// Delegate validation to the platform's certificate APIs.
    PlatformValidation,
}

/// One native (engine-side) filter chain entry: a filter name plus its
/// opaque typed configuration blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeFilterConfig {
    pub name: String,
    pub typed_config: String,
}

impl NativeFilterConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, typed_config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typed_config: typed_config.into(),
        }
    }
}

/// Engine configuration.
///
/// Built once by [`ConfigBuilder`](super::ConfigBuilder), consumed exactly
/// once by `EngineSession::start`, never mutated after hand-off.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Connection establishment timeout.
    pub connect_timeout_seconds: u64,

    /// Interval between DNS refreshes.
    pub dns_refresh_seconds: u64,

    /// Exponential backoff base for DNS refresh after failures.
    pub dns_failure_refresh_seconds_base: u64,

    /// Exponential backoff cap for DNS refresh after failures.
    pub dns_failure_refresh_seconds_max: u64,

    /// DNS query timeout.
    pub dns_query_timeout_seconds: u64,

    /// Minimum interval between DNS refreshes.
    pub dns_min_refresh_seconds: u64,

    /// Hostnames resolved before first use.
    pub dns_preresolve_hostnames: Vec<String>,

    /// Persist DNS resolutions across engine restarts.
    pub enable_dns_cache: bool,

    /// Interval between persisted-DNS-cache saves.
    pub dns_cache_save_interval_seconds: u64,

    /// Drain connections after a DNS refresh changes resolutions.
    pub enable_drain_post_dns_refresh: bool,

    /// Enable HTTP/3 (QUIC) for eligible origins.
    pub enable_http3: bool,

    /// Enable gzip response decompression.
    pub enable_gzip: bool,

    /// Enable brotli response decompression.
    pub enable_brotli: bool,

    /// Enable socket tagging for traffic accounting.
    pub enable_socket_tagging: bool,

    /// Race IPv4/IPv6 connection attempts.
    pub enable_happy_eyeballs: bool,

    /// Bind sockets to the preferred network interface.
    pub enable_interface_binding: bool,

    /// HTTP/2 connection keepalive ping interval while idle.
    pub h2_connection_keepalive_idle_interval_milliseconds: u64,

    /// HTTP/2 connection keepalive ping timeout.
    pub h2_connection_keepalive_timeout_seconds: u64,

    /// Per-host connection cap.
    pub max_connections_per_host: u32,

    /// Interval between periodic stat-sink flushes.
    pub stats_flush_seconds: u64,

    /// Idle timeout for an established stream.
    pub stream_idle_timeout_seconds: u64,

    /// Idle timeout applied to each retry attempt.
    pub per_try_idle_timeout_seconds: u64,

    /// Application version reported in stats and headers.
    pub app_version: String,

    /// Application identifier reported in stats and headers.
    pub app_id: String,

    /// Certificate chain validation policy.
    pub trust_chain_verification: TrustChainVerification,

    /// Virtual cluster configuration snippets for stat aggregation.
    pub virtual_clusters: Vec<String>,

    /// Ordered platform filter chain, referencing registered factory names.
    pub platform_filter_chain: Vec<String>,

    /// Ordered native filter chain.
    pub native_filter_chain: Vec<NativeFilterConfig>,

    /// Stat sink endpoints.
    pub stat_sinks: Vec<String>,

    /// Domain used for gRPC stat reporting, if any.
    pub grpc_stats_domain: Option<String>,

    /// Expose the local admin interface.
    pub admin_interface_enabled: bool,

    /// Skip DNS lookups for requests that will be proxied.
    pub enable_skip_dns_lookup_for_proxied_requests: bool,

    /// Use platform certificate validation APIs.
    pub enable_platform_certificates_validation: bool,

    /// Built from a `for_testing()` builder; gates test-only options.
    #[serde(skip)]
    pub(crate) testing: bool,
}

impl EngineConfig {
    /// Serializes this configuration for semantic comparison.
    ///
    /// Two configurations are semantically identical exactly when their
    /// serializations compare equal under
    /// [`templates::semantically_equal`](super::templates::semantically_equal).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
