pub mod password;
pub mod request;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{JwtSecret, SecurityConfig, MAX_JWT_EXPIRY_HOURS};
use crate::error::ApiError;

pub use request::RequestContext;

/// Message returned for every credential failure
pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

/// Token payload: the user id plus the issue and expiry instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// The verified caller of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: Uuid,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),

    #[error("JWT token expired")]
    Expired,

    #[error("Missing or malformed credential: {0}")]
    Credential(&'static str),
}

/// Issues and verifies HS256 tokens with a fixed validity window.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &JwtSecret, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose()),
            decoding_key: DecodingKey::from_secret(secret.expose()),
            ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        let hours = security.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64;
        Self::new(&security.jwt_secret, Duration::hours(hours))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims {
            user_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and expiry against `now`. A token is valid strictly before `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller-supplied clock
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| JwtError::Invalid(e.to_string()))?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }

    /// Resolve the caller of `request`, failing when no valid bearer token is present.
    pub fn identify(&self, request: &RequestContext) -> Result<Identity, ApiError> {
        self.identify_optional(request)?
            .ok_or_else(|| ApiError::authentication(AUTHENTICATION_REQUIRED))
    }

    /// Like `identify`, but a request without any credential is anonymous rather than an error.
    pub fn identify_optional(&self, request: &RequestContext) -> Result<Option<Identity>, ApiError> {
        let token = match request.bearer_token() {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(e) => return Err(reject(e)),
        };

        let claims = self.verify(token).map_err(reject)?;
        Ok(Some(Identity { user_id: claims.user_id }))
    }
}

fn reject(err: JwtError) -> ApiError {
    tracing::debug!("Rejected credential: {}", err);
    ApiError::authentication(AUTHENTICATION_REQUIRED)
}
