//! Slot model and database operations
//!
//! A slot is a bookable time window with a maximum registrant capacity.
//! Slots are ordered for display by `slot_order`. Deleting a slot is blocked
//! by the database while registrations still reference it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default capacity used when neither the request nor the
/// `max_registrations_per_slot` setting provides one.
pub const DEFAULT_MAX_REGISTRATIONS: i32 = 15;

/// Slot model representing a bookable time window
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Slot {
    /// Unique slot ID
    pub id: Uuid,

    /// Human-readable name shown on the registration form
    pub display_name: String,

    /// Display/sort key; lower values sort first
    pub slot_order: i32,

    /// Maximum number of registrations this slot accepts
    pub max_registrations: i32,

    /// When the slot was created
    pub created_at: DateTime<Utc>,

    /// When the slot was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlot {
    /// Display name
    pub display_name: String,

    /// Sort key
    pub slot_order: i32,

    /// Capacity limit
    pub max_registrations: i32,
}

/// Input for updating a slot
///
/// Only non-None fields are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSlot {
    /// New display name
    pub display_name: Option<String>,

    /// New sort key
    pub slot_order: Option<i32>,

    /// New capacity limit
    pub max_registrations: Option<i32>,
}

impl Slot {
    /// Creates a new slot
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use maktab_shared::models::slot::{Slot, CreateSlot};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let slot = Slot::create(&pool, CreateSlot {
    ///     display_name: "Saturday 10:00".to_string(),
    ///     slot_order: 1,
    ///     max_registrations: 15,
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(pool: &PgPool, data: CreateSlot) -> Result<Self, sqlx::Error> {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            INSERT INTO slots (display_name, slot_order, max_registrations)
            VALUES ($1, $2, $3)
            RETURNING id, display_name, slot_order, max_registrations,
                      created_at, updated_at
            "#,
        )
        .bind(data.display_name)
        .bind(data.slot_order)
        .bind(data.max_registrations)
        .fetch_one(pool)
        .await?;

        Ok(slot)
    }

    /// Finds a slot by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, display_name, slot_order, max_registrations,
                   created_at, updated_at
            FROM slots
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(slot)
    }

    /// Lists all slots ordered by `slot_order`
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let slots = sqlx::query_as::<_, Slot>(
            r#"
            SELECT id, display_name, slot_order, max_registrations,
                   created_at, updated_at
            FROM slots
            ORDER BY slot_order ASC, created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(slots)
    }

    /// Updates a slot; only non-None fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSlot,
    ) -> Result<Option<Self>, sqlx::Error> {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            UPDATE slots
            SET display_name = COALESCE($2, display_name),
                slot_order = COALESCE($3, slot_order),
                max_registrations = COALESCE($4, max_registrations),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, display_name, slot_order, max_registrations,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.display_name)
        .bind(data.slot_order)
        .bind(data.max_registrations)
        .fetch_optional(pool)
        .await?;

        Ok(slot)
    }

    /// Deletes a slot
    ///
    /// Fails with a foreign-key violation while registrations or attendance
    /// records still reference the slot.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all slots
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM slots")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
