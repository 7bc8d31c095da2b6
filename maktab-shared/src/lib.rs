//! # Maktab Shared Library
//!
//! This crate contains the types, persistence layer, and business logic shared
//! by the maktab API server and the report generator.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `db`: Connection pool and migration runner
//! - `auth`: Passwords, JWT tokens, and the typed authorization policy
//! - `availability`: Slot availability computation and its snapshot cache
//! - `listing`: Search and stable-sort helpers for admin list views
//! - `notify`: Change notification and debounced refresh utilities

pub mod auth;
pub mod availability;
pub mod db;
pub mod listing;
pub mod models;
pub mod notify;

/// Current version of the maktab shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
