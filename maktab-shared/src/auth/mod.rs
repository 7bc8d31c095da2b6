//! Authentication and authorization for maktab admins
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`jwt`]: HS256 access/refresh token generation and validation
//! - [`middleware`]: Request-scoped [`middleware::AuthContext`]
//! - [`policy`]: Typed authorization decisions over a [`policy::Principal`]
//!
//! The original backend expressed authorization as opaque string rule
//! expressions evaluated by the hosting service. Those are not ported;
//! authorization here is plain typed functions: super admins are
//! unrestricted, slot admins are confined to their assigned slot.

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
