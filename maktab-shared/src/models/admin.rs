//! Admin account model and database operations
//!
//! Two roles exist:
//!
//! - `super_admin`: global visibility and management rights
//! - `slot_admin`: scoped to exactly one slot (`assigned_slot_id` is
//!   required for this role, enforced by a CHECK constraint)
//!
//! Slot admins may carry a list of tajweed-level capability tags. A slot
//! whose admin has no tags configured is visible to every applicant
//! (fail-open), matching the public form's behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Recognized tajweed-level tags, in ascending order of proficiency
pub const TAJWEED_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

/// Administrator role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "admin_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Global management rights across all slots, classes, and admins
    SuperAdmin,

    /// Scoped to one slot: attendance and registrations within it only
    SlotAdmin,
}

impl AdminRole {
    /// Converts role to string for logging and claims
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::SlotAdmin => "slot_admin",
        }
    }
}

/// Admin account model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Admin {
    /// Unique admin ID
    pub id: Uuid,

    /// Login name, unique across admins
    pub username: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Role of this account
    pub role: AdminRole,

    /// Slot this admin manages (required iff role is `slot_admin`)
    pub assigned_slot_id: Option<Uuid>,

    /// Tajweed levels this admin's slot accepts
    ///
    /// None or empty means no restriction: all applicants admitted.
    pub tajweed_levels: Option<Vec<String>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new admin account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdmin {
    /// Login name
    pub username: String,

    /// Argon2id password hash (never plaintext)
    pub password_hash: String,

    /// Role
    pub role: AdminRole,

    /// Assigned slot for slot admins
    pub assigned_slot_id: Option<Uuid>,

    /// Tajweed capability tags
    pub tajweed_levels: Option<Vec<String>>,
}

/// Input for updating an admin account
///
/// Only non-None fields are updated. `assigned_slot_id` and
/// `tajweed_levels` use `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAdmin {
    /// New login name
    pub username: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New role
    pub role: Option<AdminRole>,

    /// New assigned slot (Some(None) clears)
    pub assigned_slot_id: Option<Option<Uuid>>,

    /// New capability tags (Some(None) clears)
    pub tajweed_levels: Option<Option<Vec<String>>>,
}

impl Admin {
    /// Creates a new admin account
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken (unique constraint) or the
    /// role/slot combination violates the scope check.
    pub async fn create(pool: &PgPool, data: CreateAdmin) -> Result<Self, sqlx::Error> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (username, password_hash, role, assigned_slot_id, tajweed_levels)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, role, assigned_slot_id,
                      tajweed_levels, created_at, updated_at
            "#,
        )
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.assigned_slot_id)
        .bind(data.tajweed_levels)
        .fetch_one(pool)
        .await?;

        Ok(admin)
    }

    /// Finds an admin by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, username, password_hash, role, assigned_slot_id,
                   tajweed_levels, created_at, updated_at
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(admin)
    }

    /// Finds an admin by username (login path)
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, username, password_hash, role, assigned_slot_id,
                   tajweed_levels, created_at, updated_at
            FROM admins
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(admin)
    }

    /// Lists all admin accounts
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let admins = sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, username, password_hash, role, assigned_slot_id,
                   tajweed_levels, created_at, updated_at
            FROM admins
            ORDER BY username ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(admins)
    }

    /// Updates an admin account; only non-None fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateAdmin,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Clearable fields cannot go through COALESCE: Some(None) must
        // overwrite with NULL. $5/$7 flag whether to touch them at all.
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            UPDATE admins
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                assigned_slot_id = CASE WHEN $5 THEN $6 ELSE assigned_slot_id END,
                tajweed_levels = CASE WHEN $7 THEN $8 ELSE tajweed_levels END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, password_hash, role, assigned_slot_id,
                      tajweed_levels, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.assigned_slot_id.is_some())
        .bind(data.assigned_slot_id.flatten())
        .bind(data.tajweed_levels.is_some())
        .bind(data.tajweed_levels.flatten())
        .fetch_optional(pool)
        .await?;

        Ok(admin)
    }

    /// Deletes an admin account
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether this admin's slot admits an applicant with the given tag
    ///
    /// No configured tags (None or empty) admits everyone.
    pub fn admits_level(&self, level: &str) -> bool {
        match &self.tajweed_levels {
            None => true,
            Some(levels) if levels.is_empty() => true,
            Some(levels) => levels.iter().any(|l| l == level),
        }
    }
}
