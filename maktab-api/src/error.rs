//! Error handling for the API server
//!
//! Provides a unified error type that maps to HTTP responses. All handlers
//! return `Result<T, ApiError>` which automatically converts to the
//! appropriate status code and JSON body.
//!
//! Capacity and uniqueness conflicts deserve special care here: the route
//! handlers run friendly pre-checks, but the constraints live in the
//! database, so a concurrent duplicate surfaces as a constraint violation.
//! The `From<sqlx::Error>` impl maps those back to the same user-facing
//! messages the pre-checks would have produced.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use maktab_shared::auth::{jwt::JwtError, middleware::AuthError, password::PasswordError};
use maktab_shared::auth::policy::PolicyError;
use maktab_shared::models::attendance::AttendanceValidationError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate mobile number or attendance date
    Conflict(String),

    /// Conflict (409) - the chosen slot has no seats left
    SlotFull,

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "slot_full")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::SlotFull => write!(f, "Slot is already full"),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::SlotFull => (
                StatusCode::CONFLICT,
                "slot_full",
                "This slot is already full. Please choose another slot.".to_string(),
                None,
            ),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique constraints are named in the schema, so a violation can be mapped
/// back to the same message the pre-check path uses.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint == "registrations_whatsapp_mobile_key" {
                        return ApiError::Conflict(
                            "This WhatsApp number is already registered".to_string(),
                        );
                    }
                    if constraint == "attendance_records_class_slot_date_key" {
                        return ApiError::Conflict(
                            "Attendance for this class, slot, and date already exists"
                                .to_string(),
                        );
                    }
                    // The slot foreign keys are all ON DELETE RESTRICT.
                    if constraint == "registrations_slot_id_fkey" {
                        return ApiError::Conflict(
                            "This slot still has registrations and cannot be deleted"
                                .to_string(),
                        );
                    }
                    if constraint == "admins_assigned_slot_id_fkey" {
                        return ApiError::Conflict(
                            "This slot still has assigned admins and cannot be deleted"
                                .to_string(),
                        );
                    }
                    if constraint == "attendance_records_slot_id_fkey" {
                        return ApiError::Conflict(
                            "This slot still has attendance records and cannot be deleted"
                                .to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Missing credentials".to_string())
            }
            AuthError::InvalidFormat => {
                ApiError::BadRequest("Invalid authorization header format".to_string())
            }
            AuthError::InvalidToken => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
        }
    }
}

/// Convert authorization errors to API errors
impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::SuperAdminRequired => {
                ApiError::Forbidden("Super admin role required".to_string())
            }
            PolicyError::SlotNotAssigned(_) => {
                ApiError::Forbidden("Not authorized for this slot".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert attendance validation errors to API errors
impl From<AttendanceValidationError> for ApiError {
    fn from(err: AttendanceValidationError) -> Self {
        let field = match err {
            AttendanceValidationError::CountMismatch { .. }
            | AttendanceValidationError::NegativeCount => "counts",
            _ => "attachments",
        };

        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: err.to_string(),
        }])
    }
}

/// Convert report generation errors to API errors
impl From<maktab_reports::ReportError> for ApiError {
    fn from(err: maktab_reports::ReportError) -> Self {
        match err {
            maktab_reports::ReportError::Database(e) => e.into(),
            other => ApiError::InternalError(format!("Report generation failed: {}", other)),
        }
    }
}

/// Convert validator failures to the structured validation response
pub fn validation_details(errors: &validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect()
}
