//! ClickHouse storage for hits and daily rollups.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod query;
pub mod schema;
mod store;

pub use client::*;
pub use config::*;
pub use health::{check_connection, init_schema};
pub use insert::{insert_hits, HitRow};
