//! HTTP route assembly.
//!
//! Structure:
//! - mod.rs: router assembly and the authentication gate layer
//! - auth.rs: register / login / refresh / current-user endpoints
//! - profile.rs: protected profile endpoint
//! - health.rs: liveness endpoint
//! - extractors: request-identity extractors

pub mod auth;
pub mod extractors;
pub mod health;
pub mod profile;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Create the application router with the authentication gate applied to
/// every route. The gate classifies paths itself, so public and protected
/// endpoints share one layer.
pub fn create_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Authentication endpoints (public prefix /api/auth)
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/auth/test-auth", get(auth::test_auth))
        // Protected resources
        .route("/api/profile", get(profile::get_profile))
        .layer(axum::middleware::from_fn_with_state(
            ctx.clone(),
            crate::middleware::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
