use anyhow::Result;

// ============================================================================
// Configuration Constants
// ============================================================================

const DEFAULT_PORT: u16 = 8080;

// Token validity windows, in milliseconds
pub const DEFAULT_ACCESS_TOKEN_VALIDITY_MS: i64 = 604_800_000; // 7 days
pub const DEFAULT_REFRESH_TOKEN_VALIDITY_MS: i64 = 1_209_600_000; // 14 days

/// Path prefixes reachable without a bearer token.
///
/// The gate only skips token extraction for these; final authorization is
/// still decided by the endpoint itself.
const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/api/auth",
    "/api/symptom-checker",
    "/api/appointments/debug",
];

const MIN_JWT_SECRET_LEN: usize = 32;

// ============================================================================
// Configuration Structure
// ============================================================================

/// Immutable application configuration, built once at startup and shared
/// by reference. Nothing here changes after `from_env` returns.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Symmetric HS512 signing secret.
    pub jwt_secret: String,
    /// Access token validity window (milliseconds).
    pub access_token_validity_ms: i64,
    /// Refresh token validity window (milliseconds).
    pub refresh_token_validity_ms: i64,
    /// Path prefixes that bypass authentication in the gate.
    pub public_paths: Vec<String>,
    /// Salt for hashing identifiers in log output.
    pub log_hash_salt: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = std::env::var("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long; generate one with: openssl rand -base64 32",
                MIN_JWT_SECRET_LEN
            );
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")?,
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            jwt_secret,
            access_token_validity_ms: std::env::var("JWT_ACCESS_VALIDITY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_VALIDITY_MS),
            refresh_token_validity_ms: std::env::var("JWT_REFRESH_VALIDITY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_TOKEN_VALIDITY_MS),
            public_paths: std::env::var("PUBLIC_PATHS")
                .map(|raw| {
                    raw.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| Self::default_public_paths()),
            log_hash_salt: std::env::var("LOG_HASH_SALT")
                .unwrap_or_else(|_| "carecompare-dev-salt".to_string()),
        })
    }

    pub fn default_public_paths() -> Vec<String> {
        DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect()
    }
}
