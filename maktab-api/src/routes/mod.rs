//! API route handlers
//!
//! # Modules
//!
//! - `health`: Health check
//! - `auth`: Admin login and token refresh
//! - `form`: Public registration form (settings + slot availability)
//! - `registrations`: Public submission and registration administration
//! - `slots`: Slot management
//! - `admins`: Admin account management
//! - `classes`: Class management
//! - `attendance`: Attendance record editor
//! - `settings`: Key-value settings
//! - `reports`: PDF/DOCX report download

pub mod admins;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod form;
pub mod health;
pub mod registrations;
pub mod reports;
pub mod settings;
pub mod slots;
