//! Shared setup for hitstats integration tests.

pub mod containers;
pub mod fixtures;
pub mod setup;
