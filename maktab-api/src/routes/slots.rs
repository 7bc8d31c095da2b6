//! Slot management endpoints
//!
//! Slots are structural configuration, so every operation here requires the
//! super admin role.
//!
//! # Endpoints
//!
//! - `GET /v1/slots` - List in display order
//! - `POST /v1/slots` - Create
//! - `GET /v1/slots/:id` - Fetch one
//! - `PATCH /v1/slots/:id` - Partial update
//! - `DELETE /v1/slots/:id` - Delete (fails while registrations exist)

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::policy::Principal;
use maktab_shared::listing::{filter_by_query, sort_stable, ListParams};
use maktab_shared::models::setting::{keys, Setting};
use maktab_shared::models::slot::{CreateSlot, Slot, UpdateSlot, DEFAULT_MAX_REGISTRATIONS};
use maktab_shared::notify::Collection;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Create request; capacity falls back to the configured default
#[derive(Debug, Deserialize)]
pub struct CreateSlotRequest {
    /// Display name shown on the public form
    pub display_name: String,

    /// Position in the form's slot list
    pub slot_order: i32,

    /// Capacity override; omitted means the configured default
    pub max_registrations: Option<i32>,
}

/// Lists all slots
///
/// Searches over the display name; sorts by `name` or `capacity`, or by
/// display order when no key is given.
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Slot>>> {
    Principal::from(auth).require_super_admin()?;

    let mut slots = filter_by_query(
        Slot::list_all(&state.db).await?,
        params.search.as_deref(),
        |s| vec![s.display_name.clone()],
    );

    match params.sort.as_deref() {
        Some("name") => sort_stable(&mut slots, |s| s.display_name.to_lowercase(), params.direction),
        Some("capacity") => sort_stable(&mut slots, |s| s.max_registrations, params.direction),
        _ => sort_stable(&mut slots, |s| s.slot_order, params.direction),
    }

    Ok(Json(slots))
}

/// Fetches one slot
pub async fn find(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Slot>> {
    Principal::from(auth).require_super_admin()?;

    let slot = Slot::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Slot not found".to_string()))?;

    Ok(Json(slot))
}

/// Creates a slot
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSlotRequest>,
) -> ApiResult<(StatusCode, Json<Slot>)> {
    Principal::from(auth).require_super_admin()?;

    if req.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Display name is required".to_string()));
    }

    let max_registrations = match req.max_registrations {
        Some(max) if max > 0 => max,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "Capacity must be positive".to_string(),
            ))
        }
        None => {
            Setting::get_int_or(
                &state.db,
                keys::MAX_REGISTRATIONS_PER_SLOT,
                DEFAULT_MAX_REGISTRATIONS,
            )
            .await?
        }
    };

    let slot = Slot::create(
        &state.db,
        CreateSlot {
            display_name: req.display_name,
            slot_order: req.slot_order,
            max_registrations,
        },
    )
    .await?;

    state.notifier.publish(Collection::Slots);

    Ok((StatusCode::CREATED, Json(slot)))
}

/// Partially updates a slot
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSlot>,
) -> ApiResult<Json<Slot>> {
    Principal::from(auth).require_super_admin()?;

    if matches!(req.max_registrations, Some(max) if max <= 0) {
        return Err(ApiError::BadRequest(
            "Capacity must be positive".to_string(),
        ));
    }

    let slot = Slot::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Slot not found".to_string()))?;

    state.notifier.publish(Collection::Slots);

    Ok(Json(slot))
}

/// Deletes a slot
///
/// Registrations, assigned admins, and attendance records all reference
/// slots with `ON DELETE RESTRICT`, so a slot still in use cannot be
/// removed; that surfaces as a conflict naming what still references it.
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Principal::from(auth).require_super_admin()?;

    let deleted = Slot::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Slot not found".to_string()));
    }

    state.notifier.publish(Collection::Slots);

    Ok(StatusCode::NO_CONTENT)
}
