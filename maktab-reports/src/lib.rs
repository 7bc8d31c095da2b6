//! Attendance report generation
//!
//! Builds the downloadable attendance report: decides which classes are
//! report-eligible, aggregates their attendance counts, pulls image
//! attachments lazily through a bounded worker pool, and renders the
//! result as PDF or DOCX.
//!
//! # Modules
//!
//! - [`pool`]: generic bounded-concurrency task runner with retry
//! - [`aggregate`]: eligibility rule and per-class summaries
//! - [`fetch`]: lazy attachment fetching and image preparation
//! - [`render`]: PDF and DOCX output
//!
//! # Example
//!
//! ```no_run
//! use maktab_reports::{generate, render::ReportFormat};
//!
//! # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let report = generate(&pool, ReportFormat::Pdf).await?;
//! std::fs::write(&report.filename, &report.bytes)?;
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};

pub mod aggregate;
pub mod fetch;
pub mod pool;
pub mod render;

use aggregate::summarize;
use fetch::{fetch_class_attachments, prepare_images, FetchError, DEFAULT_FETCH_CONCURRENCY};
use maktab_shared::models::admin::Admin;
use maktab_shared::models::attendance::AttendanceRecord;
use maktab_shared::models::class::Class;
use maktab_shared::models::setting::{keys, Setting};
use maktab_shared::models::slot::Slot;
use render::{
    report_filename, ClassSection, FontPresets, RenderError, ReportFormat, ReportOptions,
};

/// Error type for report generation
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Loading report inputs failed
    #[error("Failed to load report data: {0}")]
    Database(#[from] sqlx::Error),

    /// Attachment fetching failed after retries
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Document rendering failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A finished report ready for download
#[derive(Debug)]
pub struct GeneratedReport {
    /// Download filename, date-stamped
    pub filename: String,

    /// MIME type for the response
    pub content_type: &'static str,

    /// Document bytes
    pub bytes: Vec<u8>,
}

/// Generates the attendance report in the requested format
///
/// Classes without full slot coverage are omitted. Attachment payloads are
/// fetched per class with bounded concurrency rather than in the initial
/// list queries.
#[instrument(skip(db))]
pub async fn generate(db: &PgPool, format: ReportFormat) -> Result<GeneratedReport, ReportError> {
    let (classes, slots, admins, records) = tokio::try_join!(
        Class::list_all(db),
        Slot::list_all(db),
        Admin::list_all(db),
        AttendanceRecord::list_summaries(db),
    )?;

    let reports = summarize(classes, &slots, &admins, &records);
    info!(eligible = reports.len(), "Aggregated report-eligible classes");

    let class_ids: Vec<_> = reports.iter().map(|report| report.class.id).collect();
    let attachments = fetch_class_attachments(db, &class_ids, DEFAULT_FETCH_CONCURRENCY).await?;

    let mut sections = Vec::with_capacity(reports.len());
    for (report, (_, class_attachments)) in reports.into_iter().zip(attachments) {
        let images = prepare_images(class_attachments, DEFAULT_FETCH_CONCURRENCY).await;
        sections.push(ClassSection { report, images });
    }

    let title = Setting::get(db, keys::FORM_TITLE)
        .await?
        .unwrap_or_else(|| "Attendance Report".to_string());
    let supervisor_name = Setting::get(db, keys::SUPERVISOR_NAME)
        .await?
        .unwrap_or_default();
    let base_name = Setting::get(db, keys::REPORT_FILE_NAME)
        .await?
        .unwrap_or_else(|| "attendance-report".to_string());

    let options = ReportOptions {
        title,
        supervisor_name,
        generated_on: Utc::now().date_naive(),
        fonts: FontPresets::default(),
    };

    let bytes = match format {
        ReportFormat::Pdf => render::pdf::render(&sections, &options)?,
        ReportFormat::Docx => render::docx::render(&sections, &options)?,
    };

    info!(
        format = format.extension(),
        sections = sections.len(),
        size = bytes.len(),
        "Report generated"
    );

    Ok(GeneratedReport {
        filename: report_filename(&base_name, options.generated_on, format),
        content_type: format.content_type(),
        bytes,
    })
}
