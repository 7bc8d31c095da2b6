//! Admin account management endpoints
//!
//! Super admin only. Passwords arrive in plaintext over the request body
//! and are hashed before anything touches the database; responses never
//! include the hash (the model skips it during serialization).
//!
//! # Endpoints
//!
//! - `GET /v1/admins` - List accounts
//! - `POST /v1/admins` - Create account
//! - `PATCH /v1/admins/:id` - Partial update (password optional)
//! - `DELETE /v1/admins/:id` - Delete account

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::password::hash_password;
use maktab_shared::auth::policy::Principal;
use maktab_shared::listing::{filter_by_query, sort_stable, ListParams};
use maktab_shared::models::admin::{Admin, AdminRole, CreateAdmin, UpdateAdmin, TAJWEED_LEVELS};
use maktab_shared::models::slot::Slot;
use maktab_shared::notify::Collection;

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    /// Login name
    #[validate(length(min = 3, max = 60, message = "Username must be 3-60 characters"))]
    pub username: String,

    /// Plaintext password; hashed before storage
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Role
    pub role: AdminRole,

    /// Assigned slot (required for slot admins)
    pub assigned_slot_id: Option<Uuid>,

    /// Tajweed capability tags
    pub tajweed_levels: Option<Vec<String>>,
}

/// Update request; only present fields change
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdminRequest {
    /// New login name
    pub username: Option<String>,

    /// New plaintext password
    pub password: Option<String>,

    /// New role
    pub role: Option<AdminRole>,

    /// New assigned slot (null clears)
    pub assigned_slot_id: Option<Option<Uuid>>,

    /// New capability tags (null clears)
    pub tajweed_levels: Option<Option<Vec<String>>>,
}

/// Rejects tags outside the recognized tajweed levels
fn validate_levels(levels: &[String]) -> Result<(), ApiError> {
    for level in levels {
        if !TAJWEED_LEVELS.contains(&level.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "Unknown tajweed level '{}'",
                level
            )));
        }
    }
    Ok(())
}

/// Checks that a slot-admin assignment points at a real slot
async fn require_slot_exists(state: &AppState, slot_id: Uuid) -> Result<(), ApiError> {
    if Slot::find_by_id(&state.db, slot_id).await?.is_none() {
        return Err(ApiError::NotFound("Assigned slot not found".to_string()));
    }
    Ok(())
}

/// Lists all admin accounts
///
/// Searches over the username; sorts by `created_at`, or by username when
/// no key is given.
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Admin>>> {
    Principal::from(auth).require_super_admin()?;

    let mut admins = filter_by_query(
        Admin::list_all(&state.db).await?,
        params.search.as_deref(),
        |a| vec![a.username.clone()],
    );

    match params.sort.as_deref() {
        Some("created_at") => sort_stable(&mut admins, |a| a.created_at, params.direction),
        _ => sort_stable(&mut admins, |a| a.username.to_lowercase(), params.direction),
    }

    Ok(Json(admins))
}

/// Creates an admin account
///
/// # Errors
///
/// - `400 Bad Request`: Slot admin without a slot, or unknown tag
/// - `409 Conflict`: Username taken
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<Admin>)> {
    Principal::from(auth).require_super_admin()?;

    req.validate()
        .map_err(|e| ApiError::ValidationError(validation_details(&e)))?;

    match (req.role, req.assigned_slot_id) {
        (AdminRole::SlotAdmin, None) => {
            return Err(ApiError::BadRequest(
                "Slot admins must have an assigned slot".to_string(),
            ))
        }
        (AdminRole::SlotAdmin, Some(slot_id)) => require_slot_exists(&state, slot_id).await?,
        (AdminRole::SuperAdmin, Some(_)) => {
            return Err(ApiError::BadRequest(
                "Super admins cannot be assigned a slot".to_string(),
            ))
        }
        (AdminRole::SuperAdmin, None) => {}
    }

    if let Some(levels) = &req.tajweed_levels {
        validate_levels(levels)?;
    }

    let password_hash = hash_password(&req.password)?;

    let admin = Admin::create(
        &state.db,
        CreateAdmin {
            username: req.username,
            password_hash,
            role: req.role,
            assigned_slot_id: req.assigned_slot_id,
            tajweed_levels: req.tajweed_levels,
        },
    )
    .await?;

    state.notifier.publish(Collection::Admins);

    Ok((StatusCode::CREATED, Json(admin)))
}

/// Partially updates an admin account
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAdminRequest>,
) -> ApiResult<Json<Admin>> {
    Principal::from(auth).require_super_admin()?;

    if let Some(Some(slot_id)) = req.assigned_slot_id {
        require_slot_exists(&state, slot_id).await?;
    }

    if let Some(Some(levels)) = &req.tajweed_levels {
        validate_levels(levels)?;
    }

    let password_hash = match &req.password {
        Some(password) if password.len() < 8 => {
            return Err(ApiError::BadRequest(
                "Password must be at least 8 characters".to_string(),
            ))
        }
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let admin = Admin::update(
        &state.db,
        id,
        UpdateAdmin {
            username: req.username,
            password_hash,
            role: req.role,
            assigned_slot_id: req.assigned_slot_id,
            tajweed_levels: req.tajweed_levels,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

    state.notifier.publish(Collection::Admins);

    Ok(Json(admin))
}

/// Deletes an admin account
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let principal = Principal::from(auth);
    principal.require_super_admin()?;

    if principal.admin_id == id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let deleted = Admin::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Admin not found".to_string()));
    }

    state.notifier.publish(Collection::Admins);

    Ok(StatusCode::NO_CONTENT)
}
