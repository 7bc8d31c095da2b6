//! # Maktab API Server Library
//!
//! Core functionality for the maktab API server: the public registration
//! form, admin management views, attendance recording, and report
//! downloads.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
