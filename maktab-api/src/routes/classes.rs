//! Class management endpoints
//!
//! Classes are visible to every authenticated admin; creating, editing, and
//! deleting them is super-admin work.
//!
//! # Endpoints
//!
//! - `GET /v1/classes` - List classes
//! - `POST /v1/classes` - Create class
//! - `PATCH /v1/classes/:id` - Partial update
//! - `DELETE /v1/classes/:id` - Delete class

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::policy::Principal;
use maktab_shared::listing::{filter_by_query, sort_stable, ListParams};
use maktab_shared::models::class::{Class, CreateClass, UpdateClass};
use maktab_shared::notify::Collection;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Lists all classes
///
/// Searches over name and description; sorts by `duration`, or by name
/// when no key is given.
pub async fn list(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Class>>> {
    let mut classes = filter_by_query(
        Class::list_all(&state.db).await?,
        params.search.as_deref(),
        |c| vec![c.name.clone(), c.description.clone()],
    );

    match params.sort.as_deref() {
        Some("duration") => sort_stable(&mut classes, |c| c.duration_minutes, params.direction),
        _ => sort_stable(&mut classes, |c| c.name.to_lowercase(), params.direction),
    }

    Ok(Json(classes))
}

/// Creates a class
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateClass>,
) -> ApiResult<(StatusCode, Json<Class>)> {
    Principal::from(auth).require_super_admin()?;

    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Class name is required".to_string()));
    }
    if req.duration_minutes <= 0 {
        return Err(ApiError::BadRequest(
            "Duration must be positive".to_string(),
        ));
    }

    let class = Class::create(&state.db, req).await?;
    state.notifier.publish(Collection::Classes);

    Ok((StatusCode::CREATED, Json(class)))
}

/// Partially updates a class
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateClass>,
) -> ApiResult<Json<Class>> {
    Principal::from(auth).require_super_admin()?;

    if matches!(req.duration_minutes, Some(d) if d <= 0) {
        return Err(ApiError::BadRequest(
            "Duration must be positive".to_string(),
        ));
    }

    let class = Class::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    state.notifier.publish(Collection::Classes);

    Ok(Json(class))
}

/// Deletes a class
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Principal::from(auth).require_super_admin()?;

    let deleted = Class::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    state.notifier.publish(Collection::Classes);

    Ok(StatusCode::NO_CONTENT)
}
