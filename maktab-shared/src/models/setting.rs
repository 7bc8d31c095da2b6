//! Application settings as key-value rows
//!
//! Settings are plain rows read by key; the known keys are listed in
//! [`keys`]. Unknown keys are allowed (the table carries no schema beyond
//! key uniqueness).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Known setting keys
pub mod keys {
    /// Title shown above the public registration form
    pub const FORM_TITLE: &str = "form_title";

    /// Default capacity applied to newly created slots
    pub const MAX_REGISTRATIONS_PER_SLOT: &str = "max_registrations_per_slot";

    /// Supervisor name printed on reports
    pub const SUPERVISOR_NAME: &str = "supervisor_name";

    /// Base name for exported report files
    pub const REPORT_FILE_NAME: &str = "report_file_name";
}

/// One setting row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    /// Setting key
    pub key: String,

    /// Setting value (always stored as text)
    pub value: String,

    /// When the value was last changed
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Reads one setting value by key
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Reads all settings
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let settings = sqlx::query_as::<_, Setting>(
            "SELECT key, value, updated_at FROM settings ORDER BY key ASC",
        )
        .fetch_all(pool)
        .await?;

        Ok(settings)
    }

    /// Creates or replaces a setting value
    pub async fn upsert(pool: &PgPool, key: &str, value: &str) -> Result<Self, sqlx::Error> {
        let setting = sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(pool)
        .await?;

        Ok(setting)
    }

    /// Reads an integer-valued setting, falling back when absent or malformed
    pub async fn get_int_or(pool: &PgPool, key: &str, default: i32) -> Result<i32, sqlx::Error> {
        let value = Self::get(pool, key).await?;

        Ok(value
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(default))
    }
}
