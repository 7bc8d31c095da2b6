//! Class model and database operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Class model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Class {
    /// Unique class ID
    pub id: Uuid,

    /// Class name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Duration of one session in minutes
    pub duration_minutes: i32,

    /// When the class was created
    pub created_at: DateTime<Utc>,

    /// When the class was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClass {
    /// Class name
    pub name: String,

    /// Description
    pub description: String,

    /// Session duration in minutes
    pub duration_minutes: i32,
}

/// Input for updating a class; only non-None fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClass {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New duration
    pub duration_minutes: Option<i32>,
}

impl Class {
    /// Creates a new class
    pub async fn create(pool: &PgPool, data: CreateClass) -> Result<Self, sqlx::Error> {
        let class = sqlx::query_as::<_, Class>(
            r#"
            INSERT INTO classes (name, description, duration_minutes)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, duration_minutes, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.duration_minutes)
        .fetch_one(pool)
        .await?;

        Ok(class)
    }

    /// Finds a class by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let class = sqlx::query_as::<_, Class>(
            r#"
            SELECT id, name, description, duration_minutes, created_at, updated_at
            FROM classes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(class)
    }

    /// Lists all classes alphabetically
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let classes = sqlx::query_as::<_, Class>(
            r#"
            SELECT id, name, description, duration_minutes, created_at, updated_at
            FROM classes
            ORDER BY name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(classes)
    }

    /// Updates a class; only non-None fields change
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateClass,
    ) -> Result<Option<Self>, sqlx::Error> {
        let class = sqlx::query_as::<_, Class>(
            r#"
            UPDATE classes
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                duration_minutes = COALESCE($4, duration_minutes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, duration_minutes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.duration_minutes)
        .fetch_optional(pool)
        .await?;

        Ok(class)
    }

    /// Deletes a class and, via cascade, its attendance records
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
