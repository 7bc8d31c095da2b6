//! Application state and router builder
//!
//! Defines the shared application state and builds the Axum router with all
//! routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use maktab_api::{app::AppState, config::Config};
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let state = AppState::new(pool, config);
//! let app = maktab_api::app::build_router(state);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use maktab_shared::auth::{jwt, middleware::AuthContext};
use maktab_shared::availability::AvailabilityCache;
use maktab_shared::notify::{ChangeNotifier, Collection, Debouncer};

use crate::{config::Config, middleware::security::SecurityHeadersLayer};

/// How long an availability snapshot stays fresh
const AVAILABILITY_TTL: Duration = Duration::from_secs(10);

/// Window for collapsing bursts of change notifications
const REFRESH_DEBOUNCE: Duration = Duration::from_millis(750);

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// TTL cache over the public form's availability inputs
    pub availability: Arc<AvailabilityCache>,

    /// Broadcast channel announcing collection writes
    pub notifier: ChangeNotifier,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
            availability: Arc::new(AvailabilityCache::new(AVAILABILITY_TTL)),
            notifier: ChangeNotifier::default(),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Listens for collection changes and invalidates the availability cache
///
/// Slot, admin, and registration writes all feed the availability
/// computation. Rapid successive edits collapse into one invalidation
/// through the debouncer. Runs until the notifier is dropped.
pub fn spawn_availability_refresh(state: &AppState) -> tokio::task::JoinHandle<()> {
    let mut subscription = state.notifier.subscribe();
    let cache = Arc::clone(&state.availability);

    tokio::spawn(async move {
        let debouncer = Debouncer::new(REFRESH_DEBOUNCE, move || {
            let cache = Arc::clone(&cache);
            async move {
                cache.invalidate().await;
                tracing::debug!("Availability cache invalidated");
            }
        });

        while let Some(collection) = subscription.next().await {
            if matches!(
                collection,
                Collection::Slots | Collection::Admins | Collection::Registrations
            ) {
                debouncer.trigger();
            }
        }
    })
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// ├── /v1/                          # API v1 (versioned)
/// │   ├── GET  /form                # Public form: settings + availability
/// │   ├── POST /register            # Public registration submission
/// │   ├── /auth/                    # Authentication endpoints
/// │   │   ├── POST /login
/// │   │   └── POST /refresh
/// │   ├── /slots/                   # Slot management      (super admin)
/// │   ├── /admins/                  # Admin accounts       (super admin)
/// │   ├── /classes/                 # Class management     (authenticated)
/// │   ├── /registrations/           # Registration admin   (authenticated)
/// │   ├── /attendance/              # Attendance records   (authenticated)
/// │   ├── /settings/                # Settings             (super admin)
/// │   └── GET /reports/:format      # Report download      (super admin)
/// ```
///
/// Role checks finer than "authenticated" are enforced inside the handlers
/// via [`maktab_shared::auth::policy::Principal`].
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public form endpoints (no auth)
    let public_routes = Router::new()
        .route("/form", get(routes::form::get_form))
        .route("/register", post(routes::registrations::submit));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Everything below requires a valid access token.
    let admin_routes = Router::new()
        .route("/slots", get(routes::slots::list).post(routes::slots::create))
        .route(
            "/slots/:id",
            get(routes::slots::find)
                .patch(routes::slots::update)
                .delete(routes::slots::remove),
        )
        .route(
            "/admins",
            get(routes::admins::list).post(routes::admins::create),
        )
        .route(
            "/admins/:id",
            patch(routes::admins::update).delete(routes::admins::remove),
        )
        .route(
            "/classes",
            get(routes::classes::list).post(routes::classes::create),
        )
        .route(
            "/classes/:id",
            patch(routes::classes::update).delete(routes::classes::remove),
        )
        .route("/registrations", get(routes::registrations::list))
        .route("/registrations/:id", delete(routes::registrations::remove))
        .route(
            "/registrations/:id/transfer",
            post(routes::registrations::transfer),
        )
        .route(
            "/attendance",
            get(routes::attendance::list).post(routes::attendance::create),
        )
        .route(
            "/attendance/:id",
            get(routes::attendance::find)
                .patch(routes::attendance::update)
                .delete(routes::attendance::remove),
        )
        .route("/settings", get(routes::settings::list))
        .route("/settings/:key", put(routes::settings::upsert))
        .route("/reports/:format", get(routes::reports::download))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .merge(public_routes)
        .nest("/auth", auth_routes)
        .merge(admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// then injects [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = maktab_shared::auth::middleware::extract_bearer_token(auth_header)?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut()
        .insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}
