//! Attendance record endpoints
//!
//! The attendance editor's backend: count-sum and attachment validation run
//! before any write, slot admins are confined to their assigned slot, and
//! the duplicate (class, slot, date) pre-check is backstopped by the unique
//! constraint for concurrent submissions.
//!
//! # Endpoints
//!
//! - `GET /v1/attendance` - List summaries (no attachment payloads)
//! - `POST /v1/attendance` - Create record
//! - `GET /v1/attendance/:id` - Fetch one record with attachments
//! - `PATCH /v1/attendance/:id` - Partial update
//! - `DELETE /v1/attendance/:id` - Delete record

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::policy::{Principal, SlotFilter};
use maktab_shared::listing::{filter_by_query, sort_stable, ListParams};
use maktab_shared::models::attendance::{
    validate_attachments, validate_counts, AttendanceRecord, AttendanceSummary,
    CreateAttendanceRecord, UpdateAttendanceRecord,
};
use maktab_shared::models::class::Class;
use maktab_shared::notify::Collection;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Lists attendance summaries
///
/// Attachment payloads are deliberately absent; slot admins only see their
/// own slot's records. Searches over the date and the class/slot IDs;
/// sorts by `total_students`, or by attendance date when no key is given.
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<AttendanceSummary>>> {
    let principal = Principal::from(auth);

    let summaries = match principal.slot_filter() {
        SlotFilter::All => AttendanceRecord::list_summaries(&state.db).await?,
        SlotFilter::Only(slot_id) => {
            AttendanceRecord::list_summaries_by_slot(&state.db, slot_id).await?
        }
        SlotFilter::Nothing => Vec::new(),
    };

    let mut summaries = filter_by_query(summaries, params.search.as_deref(), |r| {
        vec![
            r.attendance_date.to_string(),
            r.class_id.to_string(),
            r.slot_id.to_string(),
        ]
    });

    match params.sort.as_deref() {
        Some("total_students") => {
            sort_stable(&mut summaries, |r| r.total_students, params.direction)
        }
        _ => sort_stable(&mut summaries, |r| r.attendance_date, params.direction),
    }

    Ok(Json(summaries))
}

/// Fetches one record, attachments included
pub async fn find(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AttendanceRecord>> {
    let principal = Principal::from(auth);

    let record = AttendanceRecord::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;
    principal.require_slot_access(record.slot_id)?;

    Ok(Json(record))
}

/// Creates an attendance record
///
/// # Errors
///
/// - `403 Forbidden`: Slot admin writing outside their slot
/// - `404 Not Found`: Unknown class
/// - `409 Conflict`: A record for this (class, slot, date) already exists
/// - `422 Unprocessable Entity`: Counts don't sum, or attachments invalid
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateAttendanceRecord>,
) -> ApiResult<(StatusCode, Json<AttendanceRecord>)> {
    let principal = Principal::from(auth);
    principal.require_slot_access(req.slot_id)?;

    validate_counts(
        req.students_present,
        req.students_absent,
        req.students_on_leave,
        req.total_students,
    )?;
    validate_attachments(&req.attachments)?;

    if Class::find_by_id(&state.db, req.class_id).await?.is_none() {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }

    // Friendly pre-check; the unique constraint still catches a concurrent
    // duplicate.
    if AttendanceRecord::exists_for(&state.db, req.class_id, req.slot_id, req.attendance_date)
        .await?
    {
        return Err(ApiError::Conflict(
            "Attendance for this class, slot, and date already exists".to_string(),
        ));
    }

    let record = AttendanceRecord::create(&state.db, req).await?;
    state.notifier.publish(Collection::Attendance);

    Ok((StatusCode::CREATED, Json(record)))
}

/// Partially updates a record
///
/// Count fields are validated against the merged result of the existing
/// record and the patch, so a partial count change cannot break the sum
/// invariant. A replacement attachment list must itself be valid.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAttendanceRecord>,
) -> ApiResult<Json<AttendanceRecord>> {
    let principal = Principal::from(auth);

    let existing = AttendanceRecord::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;
    principal.require_slot_access(existing.slot_id)?;

    validate_counts(
        req.students_present.unwrap_or(existing.students_present),
        req.students_absent.unwrap_or(existing.students_absent),
        req.students_on_leave.unwrap_or(existing.students_on_leave),
        req.total_students.unwrap_or(existing.total_students),
    )?;

    if let Some(attachments) = &req.attachments {
        validate_attachments(attachments)?;
    }

    if let Some(new_date) = req.attendance_date {
        if new_date != existing.attendance_date
            && AttendanceRecord::exists_for(&state.db, existing.class_id, existing.slot_id, new_date)
                .await?
        {
            return Err(ApiError::Conflict(
                "Attendance for this class, slot, and date already exists".to_string(),
            ));
        }
    }

    let record = AttendanceRecord::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;

    state.notifier.publish(Collection::Attendance);

    Ok(Json(record))
}

/// Deletes a record
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let principal = Principal::from(auth);

    let record = AttendanceRecord::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attendance record not found".to_string()))?;
    principal.require_slot_access(record.slot_id)?;

    AttendanceRecord::delete(&state.db, id).await?;
    state.notifier.publish(Collection::Attendance);

    Ok(StatusCode::NO_CONTENT)
}
