//! Engine configuration: a validated, immutable value assembled by
//! [`ConfigBuilder`] before engine start, plus the starter-template text
//! surface consumed as opaque strings.

mod builder;
mod defaults;
pub mod templates;
mod types;
mod validation;

pub use builder::ConfigBuilder;
pub use types::{EngineConfig, NativeFilterConfig, TrustChainVerification};
pub use validation::ConfigError;
