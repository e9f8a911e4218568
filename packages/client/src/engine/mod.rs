//! Engine lifecycle: the process-wide library registry, the session that
//! owns one running engine, its internal worker, stats and network posture.

mod core;
mod network;
pub mod registry;
mod session;
mod stats;

pub(crate) use self::core::EngineCommand;
pub use network::{NetworkType, ProxySettings, Status};
pub use session::{EngineSession, EngineState, StartOptions};
pub use stats::{EngineStats, EngineStatsSnapshot};
