//! Network posture types and the status code returned by best-effort
//! operations.

/// Result of a best-effort or observational engine operation.
///
/// `Failure` means the operation was not applied; callers may retry only
/// where the operation is documented idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failure,
}

impl Status {
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// Network interface class preferred for new streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Generic,
    Wlan,
    Wwan,
}

/// Proxy endpoint applied engine-wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
}

impl ProxySettings {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}
