//! Request authentication context
//!
//! The API layer validates the bearer token and stores an [`AuthContext`]
//! in request extensions; handlers read it back instead of re-parsing the
//! token.

use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::models::admin::AdminRole;

/// Error type for authentication middleware
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credentials provided
    #[error("Missing authentication credentials")]
    MissingCredentials,

    /// Authorization header is malformed
    #[error("Invalid authorization header format")]
    InvalidFormat,

    /// Token failed validation
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Authenticated admin attached to a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Admin account ID
    pub admin_id: Uuid,

    /// Admin role
    pub role: AdminRole,

    /// Assigned slot for slot admins
    pub assigned_slot_id: Option<Uuid>,
}

impl AuthContext {
    /// Builds the context from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            admin_id: claims.sub,
            role: claims.role,
            assigned_slot_id: claims.assigned_slot_id,
        }
    }
}

/// Extracts the bearer token from an Authorization header value
///
/// # Errors
///
/// Returns `AuthError::InvalidFormat` when the header is not
/// `Bearer <token>`
pub fn extract_bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}
