//! Session/login orchestrator.
//!
//! Turns registration, login and refresh requests into persisted accounts and
//! freshly issued tokens. Unlike the gate, every failure here is surfaced to
//! the caller as a typed [`AppError`] which the boundary converts to a
//! structured 400/401 response.

use crate::context::AppContext;
use crate::db::{self, NewUser, User};
use crate::error::{AppError, AppResult};
use crate::utils::log_safe_id;

/// Registration input. The password is plaintext here and nowhere past this
/// boundary: `register` hashes it before the store sees the record.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub policy_number: Option<String>,
}

/// Freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// Create an account. Fails on a username or email collision. Issues no
/// token; callers that want one issue it for the new username afterwards.
pub async fn register(ctx: &AppContext, account: NewAccount) -> AppResult<User> {
    let username_hash = log_safe_id(&account.username, &ctx.config.log_hash_salt);
    tracing::info!(user_hash = %username_hash, "registering user");

    if ctx.store.find_by_username(&account.username).await?.is_some() {
        tracing::warn!(user_hash = %username_hash, "registration rejected: username taken");
        return Err(AppError::DuplicateIdentity("Username"));
    }

    if ctx.store.find_by_email(&account.email).await?.is_some() {
        tracing::warn!(user_hash = %username_hash, "registration rejected: email taken");
        return Err(AppError::DuplicateIdentity("Email"));
    }

    let password_hash = db::hash_password(&account.password)?;

    let user = ctx
        .store
        .insert(NewUser {
            username: account.username,
            email: account.email,
            password_hash,
            policy_number: account.policy_number,
        })
        .await?;

    tracing::info!(user_hash = %username_hash, "user registered");
    Ok(user)
}

/// Login by username or email; username takes precedence when both match.
/// Returns the resolved user and an access token for their username.
pub async fn login(ctx: &AppContext, identity: &str, password: &str) -> AppResult<(User, String)> {
    let user = match ctx.store.find_by_username(identity).await? {
        Some(user) => user,
        None => ctx
            .store
            .find_by_email(identity)
            .await?
            .ok_or_else(|| AppError::UserNotFound(identity.to_string()))?,
    };

    verify_and_issue(ctx, user, password)
}

/// Login by exact policy number; same password verification and token
/// issuance path as `login`.
pub async fn login_by_policy_number(
    ctx: &AppContext,
    policy_number: &str,
    password: &str,
) -> AppResult<(User, String)> {
    let user = ctx
        .store
        .find_by_policy_number(policy_number)
        .await?
        .ok_or(AppError::InvalidPolicyNumber)?;

    verify_and_issue(ctx, user, password)
}

/// Exchange an existing token for a brand-new access/refresh pair.
///
/// The presented token only needs a verifiable signature and an extractable
/// subject; it may already be past its expiry. The subject must still resolve
/// to a live account.
pub async fn refresh(ctx: &AppContext, token: &str) -> AppResult<(User, TokenPair)> {
    let subject = ctx.tokens.decode_subject(token).map_err(|e| {
        tracing::warn!(error = %e, "refresh rejected: undecodable token");
        e
    })?;

    let user = ctx
        .store
        .find_by_username(&subject)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                subject_hash = %log_safe_id(&subject, &ctx.config.log_hash_salt),
                "refresh rejected: subject no longer exists"
            );
            AppError::UserNotFound(subject.clone())
        })?;

    let pair = TokenPair {
        token: ctx.tokens.issue_access_token(&user.username)?,
        refresh_token: ctx.tokens.issue_refresh_token(&user.username)?,
    };

    tracing::info!(
        user_hash = %log_safe_id(&user.username, &ctx.config.log_hash_salt),
        "token refreshed"
    );
    Ok((user, pair))
}

fn verify_and_issue(ctx: &AppContext, user: User, password: &str) -> AppResult<(User, String)> {
    if !db::verify_password(&user, password)? {
        tracing::warn!(
            user_hash = %log_safe_id(&user.username, &ctx.config.log_hash_salt),
            "login failed: invalid password"
        );
        return Err(AppError::InvalidCredentials);
    }

    let token = ctx.tokens.issue_access_token(&user.username)?;
    tracing::info!(
        user_hash = %log_safe_id(&user.username, &ctx.config.log_hash_salt),
        "login successful"
    );
    Ok((user, token))
}
