//! Build-time validation of engine configuration.

use std::collections::HashSet;

use thiserror::Error;

use super::builder::ConfigBuilder;
use super::types::TrustChainVerification;
use crate::extensions;

/// Errors surfaced by [`ConfigBuilder::build`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// DNS failure backoff bounds are zero or inverted.
    #[error("invalid DNS refresh bounds: {0}")]
    InvalidDnsBounds(String),

    /// A numeric option is outside its permitted range.
    #[error("invalid value for {option}: {reason}")]
    InvalidParameter {
        option: &'static str,
        reason: String,
    },

    /// `AcceptUntrusted` without `for_testing()`.
    #[error("restricted trust verification mode: {0}")]
    RestrictedTrustMode(String),

    /// A platform filter name has no registered factory.
    #[error("no filter factory registered under {0:?}")]
    UnresolvedFilter(String),

    /// The same filter name appears twice in a chain.
    #[error("filter {0:?} appears more than once in the chain")]
    DuplicateFilter(String),

    /// A stat sink entry is empty or malformed.
    #[error("invalid stat sink: {0}")]
    InvalidStatSink(String),
}

pub(super) fn validate(builder: &ConfigBuilder) -> Result<(), ConfigError> {
    if builder.dns_failure_refresh_seconds_base == 0
        || builder.dns_failure_refresh_seconds_max == 0
    {
        return Err(ConfigError::InvalidDnsBounds(format!(
            "failure refresh base ({}) and max ({}) must be nonzero",
            builder.dns_failure_refresh_seconds_base, builder.dns_failure_refresh_seconds_max,
        )));
    }
    if builder.dns_failure_refresh_seconds_base > builder.dns_failure_refresh_seconds_max {
        return Err(ConfigError::InvalidDnsBounds(format!(
            "failure refresh base ({}) exceeds max ({})",
            builder.dns_failure_refresh_seconds_base, builder.dns_failure_refresh_seconds_max,
        )));
    }
    if builder.dns_min_refresh_seconds == 0 {
        return Err(ConfigError::InvalidParameter {
            option: "dns_min_refresh_seconds",
            reason: "must be nonzero".into(),
        });
    }
    if builder.dns_refresh_seconds == 0 {
        return Err(ConfigError::InvalidParameter {
            option: "dns_refresh_seconds",
            reason: "must be nonzero".into(),
        });
    }
    if builder.connect_timeout_seconds == 0 {
        return Err(ConfigError::InvalidParameter {
            option: "connect_timeout_seconds",
            reason: "must be nonzero".into(),
        });
    }
    if builder.max_connections_per_host == 0 {
        return Err(ConfigError::InvalidParameter {
            option: "max_connections_per_host",
            reason: "must allow at least one connection".into(),
        });
    }
    if builder.enable_dns_cache && builder.dns_cache_save_interval_seconds == 0 {
        return Err(ConfigError::InvalidParameter {
            option: "dns_cache_save_interval_seconds",
            reason: "must be nonzero when the DNS cache is enabled".into(),
        });
    }

    if builder.trust_chain_verification == TrustChainVerification::AcceptUntrusted
        && !builder.testing
    {
        return Err(ConfigError::RestrictedTrustMode(
            "AcceptUntrusted is only permitted on a for_testing() builder".into(),
        ));
    }

    let mut seen = HashSet::new();
    for name in &builder.platform_filter_chain {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateFilter(name.clone()));
        }
    }
    for name in &builder.platform_filter_chain {
        if extensions::filter_factory(name).is_none() {
            return Err(ConfigError::UnresolvedFilter(name.clone()));
        }
    }

    let mut seen = HashSet::new();
    for filter in &builder.native_filter_chain {
        if !seen.insert(filter.name.as_str()) {
            return Err(ConfigError::DuplicateFilter(filter.name.clone()));
        }
    }

    for sink in &builder.stat_sinks {
        if sink.trim().is_empty() {
            return Err(ConfigError::InvalidStatSink(
                "stat sink endpoint is empty".into(),
            ));
        }
    }

    Ok(())
}
