//! # Maktab API Server
//!
//! The API server behind the maktab registration and attendance system:
//! a public registration form with capacity-aware slot availability, admin
//! management of slots, accounts, classes, and attendance records, and
//! PDF/DOCX attendance report downloads.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p maktab-api
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maktab_api::{
    app::{build_router, spawn_availability_refresh, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maktab_api=info,maktab_shared=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Maktab API server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = maktab_shared::db::create_pool(maktab_shared::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    maktab_shared::db::run_migrations(&pool).await?;

    let state = AppState::new(pool, config);

    // Collection writes invalidate the availability cache, debounced.
    let refresh_task = spawn_availability_refresh(&state);

    let bind_address = state.config.bind_address();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh_task.abort();
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    } else {
        tracing::info!("Shutdown signal received");
    }
}
