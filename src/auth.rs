use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// Claims carried by every CareCompare token. Access and refresh tokens share
/// this shape and differ only in their validity window.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the session owner.
    pub sub: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
}

/// Issues and validates signed bearer tokens (HMAC-SHA512, symmetric secret).
///
/// Expiry is deliberately not delegated to the JWT library: `decode_claims`
/// verifies the signature only, and `is_valid` compares the embedded `exp`
/// against the clock itself. This keeps expired-but-genuine tokens decodable,
/// which the refresh flow relies on.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_validity_ms: i64,
    refresh_validity_ms: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_validity_ms: config.access_token_validity_ms,
            refresh_validity_ms: config.refresh_token_validity_ms,
        }
    }

    /// Short-window token for general API use.
    pub fn issue_access_token(&self, subject: &str) -> Result<String, AppError> {
        self.issue(subject, self.access_validity_ms)
    }

    /// Long-window token accepted only by the refresh endpoint.
    pub fn issue_refresh_token(&self, subject: &str) -> Result<String, AppError> {
        self.issue(subject, self.refresh_validity_ms)
    }

    pub fn issue(&self, subject: &str, validity_ms: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::milliseconds(validity_ms)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Signature-verifies and parses a token without enforcing expiry.
    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(e.to_string()))
    }

    /// Returns the embedded subject of a genuine token, expired or not.
    pub fn decode_subject(&self, token: &str) -> Result<String, AppError> {
        Ok(self.decode_claims(token)?.sub)
    }

    /// True iff the token is genuine and its expiry is strictly in the future.
    pub fn is_valid(&self, token: &str) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => claims.exp > Utc::now().timestamp(),
            Err(_) => false,
        }
    }

    /// As `is_valid`, but additionally requires the embedded subject to match
    /// `expected_subject` exactly. The gate uses this after it has loaded a
    /// candidate user by the token's claimed subject, so a token for one user
    /// can never authenticate another.
    pub fn is_valid_for(&self, token: &str, expected_subject: &str) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => {
                claims.sub == expected_subject && claims.exp > Utc::now().timestamp()
            }
            Err(_) => false,
        }
    }
}
