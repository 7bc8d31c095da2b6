//! Settings endpoints
//!
//! Plain key-value rows read by key. Super admin only.
//!
//! # Endpoints
//!
//! - `GET /v1/settings` - List all settings
//! - `PUT /v1/settings/:key` - Create or update one setting

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;

use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::policy::Principal;
use maktab_shared::models::setting::{keys, Setting};
use maktab_shared::notify::Collection;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Keys the API accepts writes for
const KNOWN_KEYS: &[&str] = &[
    keys::FORM_TITLE,
    keys::MAX_REGISTRATIONS_PER_SLOT,
    keys::SUPERVISOR_NAME,
    keys::REPORT_FILE_NAME,
];

/// Upsert request
#[derive(Debug, Deserialize)]
pub struct UpsertSettingRequest {
    /// New value
    pub value: String,
}

/// Lists all settings
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Setting>>> {
    Principal::from(auth).require_super_admin()?;

    Ok(Json(Setting::list_all(&state.db).await?))
}

/// Creates or updates one setting
///
/// # Errors
///
/// - `400 Bad Request`: Unknown key, or a non-numeric capacity value
pub async fn upsert(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<UpsertSettingRequest>,
) -> ApiResult<Json<Setting>> {
    Principal::from(auth).require_super_admin()?;

    if !KNOWN_KEYS.contains(&key.as_str()) {
        return Err(ApiError::BadRequest(format!("Unknown setting '{}'", key)));
    }

    if key == keys::MAX_REGISTRATIONS_PER_SLOT {
        let parsed: i32 = req
            .value
            .parse()
            .map_err(|_| ApiError::BadRequest("Capacity must be a number".to_string()))?;
        if parsed <= 0 {
            return Err(ApiError::BadRequest(
                "Capacity must be positive".to_string(),
            ));
        }
    }

    let setting = Setting::upsert(&state.db, &key, &req.value).await?;
    state.notifier.publish(Collection::Settings);

    Ok(Json(setting))
}
