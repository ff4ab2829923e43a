use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// The login/refresh boundary surfaces these to clients as structured JSON;
/// the authentication gate never does (token failures there are logged and
/// the request falls through anonymously).
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Authentication =====
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    MissingCredentials(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid policy number")]
    InvalidPolicyNumber,

    // ===== Registration =====
    #[error("{0} already exists")]
    DuplicateIdentity(&'static str),

    // ===== Validation =====
    #[error("validation error: {0}")]
    Validation(String),

    // ===== Infrastructure =====
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error at the boundary layer.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidToken(_)
            | AppError::MissingCredentials(_)
            | AppError::UserNotFound(_)
            | AppError::InvalidCredentials
            | AppError::InvalidPolicyNumber => StatusCode::UNAUTHORIZED,
            AppError::DuplicateIdentity(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Hash(_)
            | AppError::Internal(_)
            | AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message, free of internal detail.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidToken(_) => "Invalid token".to_string(),
            AppError::MissingCredentials(msg) => msg.clone(),
            AppError::UserNotFound(_) => "User not found".to_string(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::InvalidPolicyNumber => "Invalid policy number".to_string(),
            AppError::DuplicateIdentity(field) => format!("{field} already exists"),
            AppError::Validation(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Stable code for programmatic error handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::MissingCredentials(_) => "MISSING_CREDENTIALS",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidPolicyNumber => "INVALID_POLICY_NUMBER",
            AppError::DuplicateIdentity(_) => "DUPLICATE_IDENTITY",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Hash(_) => "HASH_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Log this error at a level matching its class.
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_code = %code, "server error");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(error = %self, error_code = %code, "authentication failed");
        } else {
            tracing::debug!(error = %self, error_code = %code, "client error");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        let body = json!({
            "error": self.user_message(),
            "errorCode": self.error_code(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
