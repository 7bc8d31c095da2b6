/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test slot and admin creation
/// - JWT token generation
/// - Request body builders

use maktab_api::app::{build_router, AppState};
use maktab_api::config::Config;
use maktab_shared::auth::jwt::{create_token, Claims, TokenType};
use maktab_shared::models::admin::{Admin, AdminRole, CreateAdmin};
use maktab_shared::models::slot::{CreateSlot, Slot};
use sqlx::PgPool;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub slot: Slot,
    pub admin: Admin,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with one slot at the default capacity
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_capacity(15).await
    }

    /// Creates a new test context with one slot of the given capacity
    pub async fn with_capacity(max_registrations: i32) -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../maktab-shared/migrations").run(&db).await?;

        // Create test slot
        let slot = Slot::create(
            &db,
            CreateSlot {
                display_name: format!("Test Slot {}", Uuid::new_v4()),
                slot_order: 1,
                max_registrations,
            },
        )
        .await?;

        // Create super admin account (password hash unused; tokens are minted
        // directly except in the login tests, which create their own admin)
        let admin = Admin::create(
            &db,
            CreateAdmin {
                username: format!("test-admin-{}", Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
                role: AdminRole::SuperAdmin,
                assigned_slot_id: None,
                tajweed_levels: None,
            },
        )
        .await?;

        // Generate JWT token
        let claims = Claims::new(admin.id, AdminRole::SuperAdmin, None, TokenType::Access);
        let jwt_token = create_token(&claims, &config.jwt.secret)?;

        // Build app
        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            slot,
            admin,
            jwt_token,
        })
    }

    /// Returns authorization header value for the super admin
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Mints an access token scoped to one slot, as a slot admin would hold
    pub fn slot_admin_header(&self, slot_id: Uuid) -> String {
        let claims = Claims::new(
            Uuid::new_v4(),
            AdminRole::SlotAdmin,
            Some(slot_id),
            TokenType::Access,
        );
        let token = create_token(&claims, &self.config.jwt.secret).unwrap();
        format!("Bearer {}", token)
    }

    /// Mints a slot-admin access token that carries no slot assignment
    pub fn unassigned_slot_admin_header(&self) -> String {
        let claims = Claims::new(Uuid::new_v4(), AdminRole::SlotAdmin, None, TokenType::Access);
        let token = create_token(&claims, &self.config.jwt.secret).unwrap();
        format!("Bearer {}", token)
    }

    /// Creates an additional slot for multi-slot scenarios
    pub async fn create_slot(&self, max_registrations: i32) -> anyhow::Result<Slot> {
        let slot = Slot::create(
            &self.db,
            CreateSlot {
                display_name: format!("Test Slot {}", Uuid::new_v4()),
                slot_order: 2,
                max_registrations,
            },
        )
        .await?;

        Ok(slot)
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        self.cleanup_slot(self.slot.id).await?;
        Admin::delete(&self.db, self.admin.id).await?;
        Ok(())
    }

    /// Removes a slot and everything that references it
    pub async fn cleanup_slot(&self, slot_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM attendance_records WHERE slot_id = $1")
            .bind(slot_id)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM registrations WHERE slot_id = $1")
            .bind(slot_id)
            .execute(&self.db)
            .await?;
        Slot::delete(&self.db, slot_id).await?;
        Ok(())
    }
}

/// Generates a unique, regex-valid WhatsApp number
pub fn unique_mobile() -> String {
    let digits = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("+97150{:09}", digits)
}

/// Builds a valid registration submission body
pub fn registration_body(slot_id: Uuid, mobile: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Test Applicant",
        "email": "applicant@example.com",
        "whatsapp_mobile": mobile,
        "gender": "female",
        "age_group": "18-25",
        "city": "Dubai",
        "tajweed_level": "beginner",
        "slot_id": slot_id,
    })
}

/// Builds a small valid image attachment body
pub fn attachment_body(name: &str) -> serde_json::Value {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    let payload = BASE64.encode([0u8; 64]);
    serde_json::json!({
        "name": name,
        "data": payload,
        "size": 64,
        "mime_type": "image/jpeg",
    })
}
