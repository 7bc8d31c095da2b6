//! Attendance record model and database operations
//!
//! One record tallies a single (class, slot, date): students present, absent,
//! and on leave, plus 1–3 inline photo attachments as evidence. Two
//! invariants hold for every record:
//!
//! - `total_students = students_present + students_absent + students_on_leave`,
//!   validated before any write and CHECK-enforced in the schema
//! - (`class_id`, `slot_id`, `attendance_date`) is unique (constraint
//!   `attendance_records_class_slot_date_key`), so a duplicate submission
//!   under concurrency fails at the database even when the pre-check missed it
//!
//! Attachments are stored inline on the record (JSONB, base64-encoded image
//! data); list queries skip the payload column so the large blobs are only
//! pulled when a report actually needs them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Maximum decoded size of one attachment (400 KB)
pub const MAX_ATTACHMENT_BYTES: usize = 400 * 1024;

/// Maximum number of attachments per record
pub const MAX_ATTACHMENTS: usize = 3;

/// Inline image attachment carried on an attendance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Original file name
    pub name: String,

    /// Base64-encoded image bytes
    pub data: String,

    /// Decoded size in bytes, as reported by the client
    pub size: i64,

    /// MIME type; must be an image type
    pub mime_type: String,
}

impl Attachment {
    /// Decodes the base64 payload
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }
}

/// Validation failures for attendance writes
///
/// These are rejected before any network or database I/O.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceValidationError {
    /// Counts do not sum to the total
    #[error(
        "student counts do not add up: {present} present + {absent} absent \
         + {on_leave} on leave != {total} total"
    )]
    CountMismatch {
        present: i32,
        absent: i32,
        on_leave: i32,
        total: i32,
    },

    /// A negative count was supplied
    #[error("student counts must not be negative")]
    NegativeCount,

    /// No attachments present
    #[error("at least one attachment is required")]
    NoAttachments,

    /// Too many attachments present
    #[error("at most {MAX_ATTACHMENTS} attachments are allowed, got {0}")]
    TooManyAttachments(usize),

    /// Attachment exceeds the size ceiling
    #[error("attachment '{name}' is {size} bytes, above the 400 KB limit")]
    AttachmentTooLarge { name: String, size: usize },

    /// Attachment is not an image
    #[error("attachment '{name}' has type '{mime_type}'; only images are accepted")]
    NotAnImage { name: String, mime_type: String },

    /// Attachment payload is not valid base64
    #[error("attachment '{name}' is not valid base64 data")]
    InvalidData { name: String },
}

/// Checks the count-sum invariant
pub fn validate_counts(
    present: i32,
    absent: i32,
    on_leave: i32,
    total: i32,
) -> Result<(), AttendanceValidationError> {
    if present < 0 || absent < 0 || on_leave < 0 || total < 0 {
        return Err(AttendanceValidationError::NegativeCount);
    }

    // Summed in i64 so three large counts cannot wrap past the total.
    if i64::from(present) + i64::from(absent) + i64::from(on_leave) != i64::from(total) {
        return Err(AttendanceValidationError::CountMismatch {
            present,
            absent,
            on_leave,
            total,
        });
    }

    Ok(())
}

/// Checks cardinality, MIME type, and decoded size of an attachment set
pub fn validate_attachments(
    attachments: &[Attachment],
) -> Result<(), AttendanceValidationError> {
    if attachments.is_empty() {
        return Err(AttendanceValidationError::NoAttachments);
    }

    if attachments.len() > MAX_ATTACHMENTS {
        return Err(AttendanceValidationError::TooManyAttachments(
            attachments.len(),
        ));
    }

    for attachment in attachments {
        if !attachment.mime_type.starts_with("image/") {
            return Err(AttendanceValidationError::NotAnImage {
                name: attachment.name.clone(),
                mime_type: attachment.mime_type.clone(),
            });
        }

        let decoded = attachment
            .decode()
            .map_err(|_| AttendanceValidationError::InvalidData {
                name: attachment.name.clone(),
            })?;

        if decoded.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttendanceValidationError::AttachmentTooLarge {
                name: attachment.name.clone(),
                size: decoded.len(),
            });
        }
    }

    Ok(())
}

/// Full attendance record, attachments included
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    /// Unique record ID
    pub id: Uuid,

    /// Class this tally belongs to
    pub class_id: Uuid,

    /// Slot that submitted the tally
    pub slot_id: Uuid,

    /// Date the attendance was taken
    pub attendance_date: NaiveDate,

    /// Students present
    pub students_present: i32,

    /// Students absent
    pub students_absent: i32,

    /// Students on leave
    pub students_on_leave: i32,

    /// Total students (= present + absent + on leave)
    pub total_students: i32,

    /// Inline photo evidence
    pub attachments: Json<Vec<Attachment>>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Attendance record without the attachment payloads
///
/// Used by list views and report aggregation so the inline images are not
/// fetched eagerly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceSummary {
    /// Unique record ID
    pub id: Uuid,

    /// Class this tally belongs to
    pub class_id: Uuid,

    /// Slot that submitted the tally
    pub slot_id: Uuid,

    /// Date the attendance was taken
    pub attendance_date: NaiveDate,

    /// Students present
    pub students_present: i32,

    /// Students absent
    pub students_absent: i32,

    /// Students on leave
    pub students_on_leave: i32,

    /// Total students
    pub total_students: i32,

    /// Number of attachments on the record
    pub attachment_count: i32,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an attendance record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceRecord {
    /// Class
    pub class_id: Uuid,

    /// Slot
    pub slot_id: Uuid,

    /// Date
    pub attendance_date: NaiveDate,

    /// Students present
    pub students_present: i32,

    /// Students absent
    pub students_absent: i32,

    /// Students on leave
    pub students_on_leave: i32,

    /// Total students
    pub total_students: i32,

    /// Photo evidence (1–3 images)
    pub attachments: Vec<Attachment>,
}

/// Input for updating an attendance record; only non-None fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAttendanceRecord {
    /// New date
    pub attendance_date: Option<NaiveDate>,

    /// New present count
    pub students_present: Option<i32>,

    /// New absent count
    pub students_absent: Option<i32>,

    /// New on-leave count
    pub students_on_leave: Option<i32>,

    /// New total
    pub total_students: Option<i32>,

    /// Replacement attachment list (None keeps the existing list)
    pub attachments: Option<Vec<Attachment>>,
}

impl AttendanceRecord {
    /// Creates a new attendance record
    ///
    /// Callers must run [`validate_counts`] and [`validate_attachments`]
    /// first; the unique (class, slot, date) constraint still backstops a
    /// concurrent duplicate.
    pub async fn create(
        pool: &PgPool,
        data: CreateAttendanceRecord,
    ) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance_records
                (class_id, slot_id, attendance_date, students_present,
                 students_absent, students_on_leave, total_students, attachments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, class_id, slot_id, attendance_date, students_present,
                      students_absent, students_on_leave, total_students,
                      attachments, created_at, updated_at
            "#,
        )
        .bind(data.class_id)
        .bind(data.slot_id)
        .bind(data.attendance_date)
        .bind(data.students_present)
        .bind(data.students_absent)
        .bind(data.students_on_leave)
        .bind(data.total_students)
        .bind(Json(data.attachments))
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Finds a record by ID, attachments included
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, class_id, slot_id, attendance_date, students_present,
                   students_absent, students_on_leave, total_students,
                   attachments, created_at, updated_at
            FROM attendance_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Lists all records without attachment payloads, newest date first
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<AttendanceSummary>, sqlx::Error> {
        let records = sqlx::query_as::<_, AttendanceSummary>(
            r#"
            SELECT id, class_id, slot_id, attendance_date, students_present,
                   students_absent, students_on_leave, total_students,
                   jsonb_array_length(attachments)::INTEGER AS attachment_count,
                   created_at, updated_at
            FROM attendance_records
            ORDER BY attendance_date DESC, created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Lists one slot's records without attachment payloads
    pub async fn list_summaries_by_slot(
        pool: &PgPool,
        slot_id: Uuid,
    ) -> Result<Vec<AttendanceSummary>, sqlx::Error> {
        let records = sqlx::query_as::<_, AttendanceSummary>(
            r#"
            SELECT id, class_id, slot_id, attendance_date, students_present,
                   students_absent, students_on_leave, total_students,
                   jsonb_array_length(attachments)::INTEGER AS attachment_count,
                   created_at, updated_at
            FROM attendance_records
            WHERE slot_id = $1
            ORDER BY attendance_date DESC, created_at DESC
            "#,
        )
        .bind(slot_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Fetches attachment payloads for every record of one class
    ///
    /// This is the lazy path used by report generation; ordered by
    /// attendance date so report images follow the class timeline.
    pub async fn attachments_by_class(
        pool: &PgPool,
        class_id: Uuid,
    ) -> Result<Vec<Attachment>, sqlx::Error> {
        let rows: Vec<(Json<Vec<Attachment>>,)> = sqlx::query_as(
            r#"
            SELECT attachments
            FROM attendance_records
            WHERE class_id = $1
            ORDER BY attendance_date ASC
            "#,
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().flat_map(|(Json(a),)| a).collect())
    }

    /// Checks whether a (class, slot, date) tally already exists
    ///
    /// Pre-check for a friendly error; the unique constraint is the actual
    /// guarantee.
    pub async fn exists_for(
        pool: &PgPool,
        class_id: Uuid,
        slot_id: Uuid,
        attendance_date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM attendance_records
                WHERE class_id = $1 AND slot_id = $2 AND attendance_date = $3
            )
            "#,
        )
        .bind(class_id)
        .bind(slot_id)
        .bind(attendance_date)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Updates a record; only non-None fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateAttendanceRecord,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            UPDATE attendance_records
            SET attendance_date = COALESCE($2, attendance_date),
                students_present = COALESCE($3, students_present),
                students_absent = COALESCE($4, students_absent),
                students_on_leave = COALESCE($5, students_on_leave),
                total_students = COALESCE($6, total_students),
                attachments = COALESCE($7, attachments),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, class_id, slot_id, attendance_date, students_present,
                      students_absent, students_on_leave, total_students,
                      attachments, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.attendance_date)
        .bind(data.students_present)
        .bind(data.students_absent)
        .bind(data.students_on_leave)
        .bind(data.total_students)
        .bind(data.attachments.map(Json))
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Deletes a record
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_attachment(name: &str, bytes: usize) -> Attachment {
        Attachment {
            name: name.to_string(),
            data: BASE64.encode(vec![0u8; bytes]),
            size: bytes as i64,
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_counts_valid() {
        assert!(validate_counts(7, 2, 1, 10).is_ok());
        assert!(validate_counts(0, 0, 0, 0).is_ok());
    }

    #[test]
    fn test_counts_mismatch() {
        let err = validate_counts(7, 2, 2, 10).unwrap_err();
        assert!(matches!(
            err,
            AttendanceValidationError::CountMismatch { total: 10, .. }
        ));
    }

    #[test]
    fn test_counts_near_i32_max_do_not_wrap() {
        // A wrapping i32 sum of these counts would land back on the total.
        let err = validate_counts(i32::MAX, i32::MAX, 2, 0).unwrap_err();
        assert!(matches!(
            err,
            AttendanceValidationError::CountMismatch { total: 0, .. }
        ));
    }

    #[test]
    fn test_counts_negative() {
        assert!(matches!(
            validate_counts(-1, 2, 2, 3).unwrap_err(),
            AttendanceValidationError::NegativeCount
        ));
    }

    #[test]
    fn test_attachments_cardinality() {
        assert!(matches!(
            validate_attachments(&[]).unwrap_err(),
            AttendanceValidationError::NoAttachments
        ));

        let four: Vec<Attachment> = (0..4).map(|i| image_attachment(&format!("{i}.jpg"), 10)).collect();
        assert!(matches!(
            validate_attachments(&four).unwrap_err(),
            AttendanceValidationError::TooManyAttachments(4)
        ));

        let ok: Vec<Attachment> = (0..3).map(|i| image_attachment(&format!("{i}.jpg"), 10)).collect();
        assert!(validate_attachments(&ok).is_ok());
    }

    #[test]
    fn test_attachment_too_large() {
        let big = image_attachment("big.jpg", MAX_ATTACHMENT_BYTES + 1);
        assert!(matches!(
            validate_attachments(&[big]).unwrap_err(),
            AttendanceValidationError::AttachmentTooLarge { .. }
        ));

        let at_limit = image_attachment("ok.jpg", MAX_ATTACHMENT_BYTES);
        assert!(validate_attachments(&[at_limit]).is_ok());
    }

    #[test]
    fn test_attachment_must_be_image() {
        let mut pdf = image_attachment("doc.pdf", 10);
        pdf.mime_type = "application/pdf".to_string();
        assert!(matches!(
            validate_attachments(&[pdf]).unwrap_err(),
            AttendanceValidationError::NotAnImage { .. }
        ));
    }

    #[test]
    fn test_attachment_bad_base64() {
        let broken = Attachment {
            name: "broken.jpg".to_string(),
            data: "not base64!!".to_string(),
            size: 0,
            mime_type: "image/jpeg".to_string(),
        };
        assert!(matches!(
            validate_attachments(&[broken]).unwrap_err(),
            AttendanceValidationError::InvalidData { .. }
        ));
    }
}
