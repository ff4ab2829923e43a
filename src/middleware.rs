use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::context::AppContext;
use crate::routes::extractors::CurrentUser;
use crate::utils::log_safe_id;

/// Header carrying the per-request trace ID.
const HEADER_REQUEST_ID: &str = "x-request-id";

/// Authority granted to every authenticated caller.
pub const ROLE_USER: &str = "ROLE_USER";

/// Checks whether a request path bypasses authentication.
///
/// Membership is a union of prefixes: `/api/auth` covers `/api/auth/login`,
/// `/api/auth/anything`, and so on. Any path not listed is protected as far
/// as the gate is concerned; endpoints decide final authorization themselves.
pub fn is_public_path(public_paths: &[String], path: &str) -> bool {
    public_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Per-request authentication gate.
///
/// Extracts and validates the bearer token, loads the matching user and
/// installs a [`CurrentUser`] in the request extensions. Every failure mode
/// (missing header, malformed token, bad signature, expired, unknown subject,
/// subject mismatch) is logged and the request proceeds anonymously; the gate
/// itself never produces a 401. Protected endpoints reject anonymous requests
/// through the `CurrentUser` extractor.
pub async fn authenticate(
    State(ctx): State<Arc<AppContext>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Trace ID for every request, public or not
    let request_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(HeaderName::from_static(HEADER_REQUEST_ID), value);
    }

    if is_public_path(&ctx.config.public_paths, &path) {
        tracing::debug!(path = %path, "public path, skipping token validation");
        return next.run(request).await;
    }

    let Some(token) = bearer_token(&request) else {
        tracing::debug!(path = %path, "no bearer token on request");
        return next.run(request).await;
    };

    let subject = match ctx.tokens.decode_subject(&token) {
        Ok(subject) => subject,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "token decode failed");
            return next.run(request).await;
        }
    };

    let user = match ctx.store.find_by_username(&subject).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(
                path = %path,
                subject_hash = %log_safe_id(&subject, &ctx.config.log_hash_salt),
                "token subject does not resolve to a user"
            );
            return next.run(request).await;
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "user lookup failed during authentication");
            return next.run(request).await;
        }
    };

    // Re-validate against the loaded record: expiry re-checked against the
    // clock, subject must match exactly.
    if !ctx.tokens.is_valid_for(&token, &user.username) {
        tracing::warn!(
            path = %path,
            user_hash = %log_safe_id(&user.username, &ctx.config.log_hash_salt),
            "token failed validation"
        );
        return next.run(request).await;
    }

    // Install the identity at most once per request
    if request.extensions().get::<CurrentUser>().is_none() {
        tracing::debug!(
            path = %path,
            user_hash = %log_safe_id(&user.username, &ctx.config.log_hash_salt),
            request_id = %request_id,
            "request authenticated"
        );
        request.extensions_mut().insert(CurrentUser {
            user: Arc::new(user),
            authorities: vec![ROLE_USER.to_string()],
        });
    }

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}
