//! # Aqueduct Client
//!
//! Managed HTTP engine with an explicit lifecycle. One process-wide engine
//! library, one live engine at a time, opaque stream handles, and callback
//! delivery with per-stream ordering guarantees.
//!
//! ## Features
//!
//! - **Exactly-once library initialization** guarded across threads
//! - **Validated, immutable configuration** produced by a fluent builder
//! - **Opaque stream handles** with a strict send-side state machine
//! - **Per-stream callback ordering** with a terminal-event latch
//! - **Explicit flow control** via one-shot read budgets
//! - **Name-keyed extension registries** for filters, key-value stores,
//!   and string accessors
//! - **Atomic engine stats** with named counter elements and tags
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aqueduct_client::{ConfigBuilder, EngineSession, StartOptions};
//!
//! let config = ConfigBuilder::new()
//!     .with_connect_timeout_seconds(10)
//!     .with_app_id("demo")
//!     .build()
//!     .expect("valid config");
//!
//! let session = EngineSession::start(config, StartOptions::default())
//!     .expect("engine starts");
//! let stream = session.init_stream().expect("stream allocated");
//! drop(stream);
//! session.terminate();
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod callbacks;
pub mod config;
pub mod engine;
pub mod error;
pub mod extensions;
pub mod stream;

pub mod prelude;

pub use crate::prelude::*;
