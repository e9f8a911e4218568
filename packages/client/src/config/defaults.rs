//! Default values for the configuration builder.
//!
//! These match the starter defaults of the managed engine: conservative
//! timeouts, gzip on, HTTP/3 and brotli off, full trust-chain verification.

use super::builder::ConfigBuilder;
use super::types::TrustChainVerification;

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 30,
            dns_refresh_seconds: 60,
            dns_failure_refresh_seconds_base: 2,
            dns_failure_refresh_seconds_max: 10,
            dns_query_timeout_seconds: 25,
            dns_min_refresh_seconds: 60,
            dns_preresolve_hostnames: Vec::new(),
            enable_dns_cache: false,
            dns_cache_save_interval_seconds: 1,
            enable_drain_post_dns_refresh: false,
            enable_http3: false,
            enable_gzip: true,
            enable_brotli: false,
            enable_socket_tagging: true,
            enable_happy_eyeballs: true,
            enable_interface_binding: false,
            h2_connection_keepalive_idle_interval_milliseconds: 1,
            h2_connection_keepalive_timeout_seconds: 10,
            max_connections_per_host: 7,
            stats_flush_seconds: 60,
            stream_idle_timeout_seconds: 15,
            per_try_idle_timeout_seconds: 15,
            app_version: "unspecified".to_string(),
            app_id: "unspecified".to_string(),
            trust_chain_verification: TrustChainVerification::Verify,
            virtual_clusters: Vec::new(),
            platform_filter_chain: Vec::new(),
            native_filter_chain: Vec::new(),
            stat_sinks: Vec::new(),
            grpc_stats_domain: None,
            admin_interface_enabled: false,
            enable_skip_dns_lookup_for_proxied_requests: false,
            enable_platform_certificates_validation: true,
            testing: false,
        }
    }
}
