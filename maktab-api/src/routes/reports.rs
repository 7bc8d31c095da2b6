//! Report download endpoint
//!
//! Generates the attendance report on demand and streams it back as a file
//! download. Super admin only; generation pulls attachment payloads, which
//! slot admins have no business bulk-exporting.
//!
//! # Endpoint
//!
//! ```text
//! GET /v1/reports/:format        (format = "pdf" | "docx")
//! ```

use axum::{
    extract::{Extension, Path, State},
    http::{header, HeaderMap, HeaderValue},
};
use maktab_reports::render::ReportFormat;
use maktab_shared::auth::middleware::AuthContext;
use maktab_shared::auth::policy::Principal;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Generates and downloads the report
///
/// The response carries `Content-Disposition: attachment` with the
/// configured base name and an ISO date stamp.
pub async fn download(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(format): Path<String>,
) -> ApiResult<(HeaderMap, Vec<u8>)> {
    Principal::from(auth).require_super_admin()?;

    let format = match format.as_str() {
        "pdf" => ReportFormat::Pdf,
        "docx" => ReportFormat::Docx,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown report format '{}'; use 'pdf' or 'docx'",
                other
            )))
        }
    };

    let report = maktab_reports::generate(&state.db, format).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(report.content_type),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.filename))
            .map_err(|e| ApiError::InternalError(format!("Invalid filename header: {}", e)))?,
    );

    Ok((headers, report.bytes))
}
