use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod auth;
pub mod auth_service;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod utils;

use auth::TokenService;
use config::Config;
use context::AppContext;
use db::PgUserStore;

pub async fn run() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    let bind_address = format!("0.0.0.0:{}", config.port);

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Apply database migrations
    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("Database migrations applied");

    let ctx = Arc::new(AppContext::new(
        Arc::new(PgUserStore::new(db_pool)),
        Arc::new(TokenService::new(&config)),
        config,
    ));

    let app = routes::create_router(ctx);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("CareCompare server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
