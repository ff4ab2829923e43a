//! Profile endpoint: the minimal protected downstream resource.
//!
//! Access control happens entirely in the `CurrentUser` extractor: the gate
//! forwards every request, and this endpoint rejects the ones that arrived
//! without an installed identity.

use axum::{response::IntoResponse, Json};

use crate::routes::auth::UserSummary;
use crate::routes::extractors::CurrentUser;

/// GET /api/profile
pub async fn get_profile(user: CurrentUser) -> impl IntoResponse {
    Json(UserSummary::from(user.user.as_ref()))
}
