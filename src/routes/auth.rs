//! Authentication endpoints.
//!
//! - POST /api/auth/register - create an account, returns a token
//! - POST /api/auth/login - username/email or policy-number login
//! - POST /api/auth/refresh - exchange a token for a new access/refresh pair
//! - GET /api/auth/user - the caller's identity, 401 when anonymous
//! - GET /api/auth/test-auth - authentication probe

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::auth_service::{self, NewAccount};
use crate::context::AppContext;
use crate::db::User;
use crate::error::AppError;
use crate::routes::extractors::OptionalCurrentUser;

/// Public view of an account, as returned by the auth endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub policy_number: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            policy_number: user.policy_number.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub policy_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
    pub token: String,
}

/// POST /api/auth/register
///
/// Creates the account, then immediately issues an access token for the new
/// username so the client can proceed without a separate login round trip.
pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.username.is_empty() || request.password.is_empty() || request.email.is_empty() {
        return Err(AppError::Validation(
            "Username, password, and email are required".to_string(),
        ));
    }

    let policy_number = request.policy_number.filter(|p| !p.is_empty());

    let user = auth_service::register(
        &ctx,
        NewAccount {
            username: request.username,
            email: request.email,
            password: request.password,
            policy_number,
        },
    )
    .await?;

    let token = ctx.tokens.issue_access_token(&user.username)?;

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email.
    pub username: Option<String>,
    pub policy_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// POST /api/auth/login
///
/// Accepts either a username/email or a policy number; the policy-number flow
/// takes precedence when both are supplied.
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::MissingCredentials("Password is required".to_string()))?;

    let (user, token) = match (
        request.policy_number.filter(|p| !p.is_empty()),
        request.username.filter(|u| !u.is_empty()),
    ) {
        (Some(policy_number), _) => {
            auth_service::login_by_policy_number(&ctx, &policy_number, &password).await?
        }
        (None, Some(identity)) => auth_service::login(&ctx, &identity, &password).await?,
        (None, None) => {
            return Err(AppError::MissingCredentials(
                "Username/email or policy number is required".to_string(),
            ))
        }
    };

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

/// POST /api/auth/refresh
///
/// Takes the existing token from the Authorization header. The token's
/// signature must verify and its subject must still exist; expiry is not
/// required, so an expired session can be renewed.
pub async fn refresh(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::InvalidToken("missing bearer token".to_string()))?;

    let (_user, pair) = auth_service::refresh(&ctx, token).await?;

    Ok((
        StatusCode::OK,
        Json(RefreshResponse {
            token: pair.token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

/// GET /api/auth/user
pub async fn current_user(user: OptionalCurrentUser) -> impl IntoResponse {
    match user.0 {
        Some(identity) => {
            (StatusCode::OK, Json(json!(UserSummary::from(identity.user.as_ref())))).into_response()
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not authenticated" })),
        )
            .into_response(),
    }
}

/// GET /api/auth/test-auth
///
/// Probe endpoint reporting whether the gate identified the caller.
pub async fn test_auth(user: OptionalCurrentUser) -> impl IntoResponse {
    match user.0 {
        Some(identity) => (
            StatusCode::OK,
            Json(json!({
                "message": "Authentication successful",
                "username": identity.username(),
                "authorities": identity.authorities,
            })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not authenticated" })),
        )
            .into_response(),
    }
}
