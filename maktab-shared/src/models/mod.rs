//! Database models for maktab
//!
//! Each model follows the same shape: the row struct, `Create*`/`Update*`
//! input structs, and inherent async CRUD operations taking a `&PgPool`.
//!
//! # Models
//!
//! - `slot`: Bookable time windows with registrant capacity
//! - `admin`: Administrator accounts (super admins and slot admins)
//! - `registration`: Public registrations, capacity-checked at insert
//! - `class`: Classes taught across slots
//! - `attendance`: Per-class, per-slot, per-date attendance tallies with
//!   inline photo attachments
//! - `setting`: Key-value application settings

pub mod admin;
pub mod attendance;
pub mod class;
pub mod registration;
pub mod setting;
pub mod slot;
