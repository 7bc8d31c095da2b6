//! Database layer for maktab
//!
//! Provides connection pooling and the migration runner. Models live in the
//! `models` module at the crate root.

pub mod migrations;
pub mod pool;

pub use migrations::run_migrations;
pub use pool::{close_pool, create_pool, health_check, DatabaseConfig};
