use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::fmt;

use super::JwtError;

#[derive(Clone, Default)]
enum Credential {
    #[default]
    Absent,
    Header(String),
    /// Header present but not valid UTF-8
    Malformed,
}

/// Per-request data the resolvers need: the caller's raw credential.
#[derive(Clone, Default)]
pub struct RequestContext {
    credential: Credential,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let credential = match headers.get(AUTHORIZATION) {
            None => Credential::Absent,
            Some(value) => match value.to_str() {
                Ok(raw) => Credential::Header(raw.to_string()),
                Err(_) => Credential::Malformed,
            },
        };
        Self { credential }
    }

    /// Context carrying `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Self {
        Self::with_authorization(format!("Bearer {}", token))
    }

    /// Context carrying an arbitrary `Authorization` header value
    pub fn with_authorization(raw: impl Into<String>) -> Self {
        Self {
            credential: Credential::Header(raw.into()),
        }
    }

    /// Extract the JWT from the Authorization header. `Ok(None)` means no header.
    pub fn bearer_token(&self) -> Result<Option<&str>, JwtError> {
        let raw = match &self.credential {
            Credential::Absent => return Ok(None),
            Credential::Malformed => return Err(JwtError::Credential("Invalid Authorization header format")),
            Credential::Header(raw) => raw,
        };

        match raw.strip_prefix("Bearer ") {
            Some(token) if token.trim().is_empty() => Err(JwtError::Credential("Empty JWT token")),
            Some(token) => Ok(Some(token.trim())),
            None => Err(JwtError::Credential("Authorization header must use Bearer token format")),
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let credential = match self.credential {
            Credential::Absent => "absent",
            Credential::Header(_) => "<redacted>",
            Credential::Malformed => "malformed",
        };
        f.debug_struct("RequestContext").field("credential", &credential).finish()
    }
}
