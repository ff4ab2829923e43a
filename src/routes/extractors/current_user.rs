use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

use crate::db::User;

/// The resolved caller for one request.
///
/// Installed into the request extensions by the authentication gate after a
/// token has been signature-verified, matched against a live user record and
/// checked for expiry. Discarded when the request completes; nothing here is
/// ever persisted.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: Arc<User>,
    pub authorities: Vec<String>,
}

impl CurrentUser {
    pub fn username(&self) -> &str {
        &self.user.username
    }
}

/// Rejects with 401 when the gate installed no identity. This is where the
/// client-visible consequence of a missing, malformed or expired token
/// appears; the gate itself stays silent.
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| {
                let body = json!({
                    "error": "Not authenticated",
                    "errorCode": "AUTH_REQUIRED",
                    "status": 401,
                });
                (axum::http::StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
            })
    }
}

/// For endpoints that serve both authenticated and anonymous callers.
#[derive(Debug, Clone)]
pub struct OptionalCurrentUser(pub Option<CurrentUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalCurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalCurrentUser(
            parts.extensions.get::<CurrentUser>().cloned(),
        ))
    }
}
