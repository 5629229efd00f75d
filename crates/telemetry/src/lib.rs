//! Internal telemetry for hitstats.
//!
//! Structured logging through `tracing`, plus in-process counters and a
//! health registry that the binary reports on shutdown.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
