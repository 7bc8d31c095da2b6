//! Registration model and database operations
//!
//! Registrations are the public-facing entity: an applicant picks a slot and
//! submits their details. Two invariants are owned by the database rather
//! than pre-checks alone:
//!
//! - `whatsapp_mobile` is unique (constraint `registrations_whatsapp_mobile_key`)
//! - a slot never exceeds `max_registrations`, enforced by
//!   [`Registration::create_if_capacity`], which locks the slot row before
//!   counting so concurrent submissions cannot oversubscribe

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// International phone number: optional `+`, then 8–15 digits
static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("phone regex is valid"));

/// Registration model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    /// Unique registration ID
    pub id: Uuid,

    /// Applicant name
    pub name: String,

    /// Applicant email
    pub email: String,

    /// WhatsApp mobile number, unique per applicant
    pub whatsapp_mobile: String,

    /// Applicant gender
    pub gender: String,

    /// Applicant age group
    pub age_group: String,

    /// Applicant city
    pub city: String,

    /// Applicant tajweed level, if declared
    pub tajweed_level: Option<String>,

    /// Slot the applicant registered into
    pub slot_id: Uuid,

    /// When the applicant registered
    pub registered_at: DateTime<Utc>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Registration joined with its slot's display name, for admin list views
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegistrationWithSlot {
    /// The registration row
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: Registration,

    /// Display name of the registered slot
    pub slot_display_name: String,
}

/// Input for creating a registration
///
/// Field formats are validated before any database I/O; run
/// [`Validate::validate`] first.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRegistration {
    /// Applicant name
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    /// Applicant email
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// WhatsApp mobile number
    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub whatsapp_mobile: String,

    /// Applicant gender
    #[validate(length(min = 1, message = "Gender is required"))]
    pub gender: String,

    /// Applicant age group
    #[validate(length(min = 1, message = "Age group is required"))]
    pub age_group: String,

    /// Applicant city
    #[validate(length(min = 1, max = 120, message = "City is required"))]
    pub city: String,

    /// Declared tajweed level
    pub tajweed_level: Option<String>,

    /// Chosen slot
    pub slot_id: Uuid,
}

impl Registration {
    /// Inserts a registration only if the chosen slot has free capacity
    ///
    /// The slot row is locked (`FOR UPDATE`) before the current count is
    /// taken, so two concurrent submissions for the last seat serialize and
    /// only one succeeds.
    ///
    /// # Returns
    ///
    /// - `Some(registration)` on success
    /// - `None` if the slot is at capacity or does not exist (callers
    ///   distinguish the two by fetching the slot)
    ///
    /// # Errors
    ///
    /// Returns an error on constraint violations (duplicate mobile number)
    /// or other database failures.
    pub async fn create_if_capacity(
        pool: &PgPool,
        data: CreateRegistration,
    ) -> Result<Option<Self>, sqlx::Error> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            WITH locked_slot AS (
                SELECT id, max_registrations
                FROM slots
                WHERE id = $1
                FOR UPDATE
            )
            INSERT INTO registrations
                (slot_id, name, email, whatsapp_mobile, gender, age_group, city, tajweed_level)
            SELECT locked_slot.id, $2, $3, $4, $5, $6, $7, $8
            FROM locked_slot
            WHERE (
                SELECT COUNT(*) FROM registrations
                WHERE slot_id = locked_slot.id
            ) < locked_slot.max_registrations
            RETURNING id, name, email, whatsapp_mobile, gender, age_group, city,
                      tajweed_level, slot_id, registered_at, created_at, updated_at
            "#,
        )
        .bind(data.slot_id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.whatsapp_mobile)
        .bind(data.gender)
        .bind(data.age_group)
        .bind(data.city)
        .bind(data.tajweed_level)
        .fetch_optional(pool)
        .await?;

        Ok(registration)
    }

    /// Finds a registration by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, name, email, whatsapp_mobile, gender, age_group, city,
                   tajweed_level, slot_id, registered_at, created_at, updated_at
            FROM registrations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(registration)
    }

    /// Lists all registrations, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let registrations = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, name, email, whatsapp_mobile, gender, age_group, city,
                   tajweed_level, slot_id, registered_at, created_at, updated_at
            FROM registrations
            ORDER BY registered_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(registrations)
    }

    /// Lists registrations with their slot's display name expanded
    pub async fn list_with_slot(pool: &PgPool) -> Result<Vec<RegistrationWithSlot>, sqlx::Error> {
        let registrations = sqlx::query_as::<_, RegistrationWithSlot>(
            r#"
            SELECT r.id, r.name, r.email, r.whatsapp_mobile, r.gender, r.age_group,
                   r.city, r.tajweed_level, r.slot_id, r.registered_at,
                   r.created_at, r.updated_at,
                   s.display_name AS slot_display_name
            FROM registrations r
            JOIN slots s ON s.id = r.slot_id
            ORDER BY r.registered_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(registrations)
    }

    /// Lists registrations within one slot, newest first
    pub async fn list_by_slot(pool: &PgPool, slot_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let registrations = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, name, email, whatsapp_mobile, gender, age_group, city,
                   tajweed_level, slot_id, registered_at, created_at, updated_at
            FROM registrations
            WHERE slot_id = $1
            ORDER BY registered_at DESC
            "#,
        )
        .bind(slot_id)
        .fetch_all(pool)
        .await?;

        Ok(registrations)
    }

    /// Checks whether a mobile number is already registered
    ///
    /// Pre-check for a friendly error message; the unique constraint is the
    /// actual guarantee.
    pub async fn exists_by_mobile(pool: &PgPool, mobile: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE whatsapp_mobile = $1)",
        )
        .bind(mobile)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Counts registrations in a slot
    pub async fn count_by_slot(pool: &PgPool, slot_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE slot_id = $1")
                .bind(slot_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Moves a registration to another slot
    ///
    /// Transfer is an administrative override: it bypasses the capacity
    /// check on the target slot by design.
    pub async fn transfer(
        pool: &PgPool,
        id: Uuid,
        new_slot_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET slot_id = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, whatsapp_mobile, gender, age_group, city,
                      tajweed_level, slot_id, registered_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new_slot_id)
        .fetch_optional(pool)
        .await?;

        Ok(registration)
    }

    /// Deletes a registration
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
