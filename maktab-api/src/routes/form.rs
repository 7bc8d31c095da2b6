//! Public registration form endpoint
//!
//! One call gives the public form everything it renders: the configured
//! title, the per-slot default capacity, and which slots are still open
//! (optionally filtered by the applicant's declared tajweed level).
//!
//! # Endpoint
//!
//! ```text
//! GET /v1/form?level=beginner&refresh=true
//! ```

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use maktab_shared::availability::SlotAvailability;
use maktab_shared::models::setting::{keys, Setting};

use crate::{app::AppState, error::ApiResult};

/// Query parameters for the form endpoint
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    /// Applicant's declared tajweed level, used to filter slots
    pub level: Option<String>,

    /// Bypass the availability cache
    #[serde(default)]
    pub refresh: bool,
}

/// Form response
#[derive(Debug, Serialize)]
pub struct FormResponse {
    /// Configured form title
    pub form_title: String,

    /// Slots that can still be booked
    pub available_slots: Vec<SlotAvailability>,
}

/// Returns the form title and currently available slots
///
/// Availability comes from a seconds-scale snapshot cache; pass
/// `refresh=true` to force a refetch (used right after a failed
/// submission so the form reflects the latest state).
pub async fn get_form(
    State(state): State<AppState>,
    Query(query): Query<FormQuery>,
) -> ApiResult<Json<FormResponse>> {
    let form_title = Setting::get(&state.db, keys::FORM_TITLE)
        .await?
        .unwrap_or_else(|| "Registration".to_string());

    let snapshot = state.availability.snapshot(&state.db, query.refresh).await?;
    let available_slots = snapshot.available(query.level.as_deref());

    Ok(Json(FormResponse {
        form_title,
        available_slots,
    }))
}
