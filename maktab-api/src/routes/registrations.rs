//! Registration endpoints
//!
//! The public submission path and the admin management views.
//!
//! # Endpoints
//!
//! - `POST /v1/register` - Public submission (no auth)
//! - `GET /v1/registrations` - List with slot names (authenticated)
//! - `DELETE /v1/registrations/:id` - Delete (authenticated)
//! - `POST /v1/registrations/:id/transfer` - Move to another slot
//!
//! Submission order: field validation, friendly duplicate pre-check, then
//! the capacity-checked insert. The insert locks the slot row, so two
//! concurrent submissions for the last seat serialize and one gets a
//! `slot_full` conflict; the duplicate pre-check is likewise backstopped by
//! the unique mobile-number constraint.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::policy::{Principal, SlotFilter};
use maktab_shared::listing::{filter_by_query, sort_stable, ListParams};
use maktab_shared::models::registration::{
    CreateRegistration, Registration, RegistrationWithSlot,
};
use maktab_shared::models::slot::Slot;
use maktab_shared::notify::Collection;

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};

/// Transfer request
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Target slot
    pub slot_id: Uuid,
}

/// Public registration submission
///
/// # Errors
///
/// - `404 Not Found`: Chosen slot does not exist
/// - `409 Conflict`: Slot full, or mobile number already registered
/// - `422 Unprocessable Entity`: Field validation failed
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<CreateRegistration>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(validation_details(&e)))?;

    // Friendly pre-check; the unique constraint still catches a concurrent
    // duplicate.
    if Registration::exists_by_mobile(&state.db, &req.whatsapp_mobile).await? {
        return Err(ApiError::Conflict(
            "This WhatsApp number is already registered".to_string(),
        ));
    }

    let slot_id = req.slot_id;
    let registration = match Registration::create_if_capacity(&state.db, req).await? {
        Some(registration) => registration,
        None => {
            // Either the slot is full or it never existed.
            return match Slot::find_by_id(&state.db, slot_id).await? {
                Some(_) => Err(ApiError::SlotFull),
                None => Err(ApiError::NotFound("Slot not found".to_string())),
            };
        }
    };

    state.notifier.publish(Collection::Registrations);

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Lists registrations with their slot names
///
/// Slot admins only see registrations in their assigned slot. Supports the
/// admin table's substring search (name, email, mobile, city, slot name)
/// and single-key stable sort (`name`, or `registered_at` by default).
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<RegistrationWithSlot>>> {
    let principal = Principal::from(auth);

    let registrations = match principal.slot_filter() {
        SlotFilter::All => Registration::list_with_slot(&state.db).await?,
        SlotFilter::Only(slot_id) => Registration::list_with_slot(&state.db)
            .await?
            .into_iter()
            .filter(|r| r.registration.slot_id == slot_id)
            .collect(),
        SlotFilter::Nothing => Vec::new(),
    };

    let mut registrations = filter_by_query(registrations, params.search.as_deref(), |r| {
        vec![
            r.registration.name.clone(),
            r.registration.email.clone(),
            r.registration.whatsapp_mobile.clone(),
            r.registration.city.clone(),
            r.slot_display_name.clone(),
        ]
    });

    match params.sort.as_deref() {
        Some("name") => sort_stable(
            &mut registrations,
            |r| r.registration.name.to_lowercase(),
            params.direction,
        ),
        _ => sort_stable(
            &mut registrations,
            |r| r.registration.registered_at,
            params.direction,
        ),
    }

    Ok(Json(registrations))
}

/// Deletes a registration
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let principal = Principal::from(auth);

    let registration = Registration::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;
    principal.require_slot_access(registration.slot_id)?;

    Registration::delete(&state.db, id).await?;
    state.notifier.publish(Collection::Registrations);

    Ok(StatusCode::NO_CONTENT)
}

/// Moves a registration to another slot
///
/// An administrative override: the target slot's capacity is not checked.
/// Super admin only.
pub async fn transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<Json<Registration>> {
    let principal = Principal::from(auth);
    principal.require_super_admin()?;

    if Slot::find_by_id(&state.db, req.slot_id).await?.is_none() {
        return Err(ApiError::NotFound("Target slot not found".to_string()));
    }

    let registration = Registration::transfer(&state.db, id, req.slot_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    state.notifier.publish(Collection::Registrations);

    Ok(Json(registration))
}
