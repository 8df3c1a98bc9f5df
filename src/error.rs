// API Error Types
use async_graphql::ErrorExtensions;
use serde_json::json;
use std::collections::HashMap;

use crate::database::DatabaseError;

/// API error with status codes and client-friendly messages.
///
/// Authentication and authorization failures always carry generic messages
/// so that callers cannot tell an expired token from a forged one, or a
/// missing resource from one owned by somebody else.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Authentication(String),

    // 403 Forbidden
    Authorization(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::Authentication(_) => 401,
            ApiError::Authorization(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation { message, .. } => message,
            ApiError::Authentication(msg) => msg,
            ApiError::Authorization(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "BAD_USER_INPUT",
            ApiError::Authentication(_) => "UNAUTHENTICATED",
            ApiError::Authorization(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure on a single input field
    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), problem.into());
        ApiError::validation("Invalid input", Some(field_errors))
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        ApiError::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::UniqueViolation(field) => {
                ApiError::conflict(format!("{} already in use", field))
            }
            DatabaseError::ConfigMissing(_) | DatabaseError::Connection(_) => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Migration(migrate_err) => {
                tracing::error!("Migration error: {}", migrate_err);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// GraphQL error envelope: message plus `extensions.code`
impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code().to_string();
        let field_errors = match self {
            ApiError::Validation { field_errors: Some(field_errors), .. } => Some(field_errors.clone()),
            _ => None,
        };

        async_graphql::Error::new(self.message()).extend_with(|_, e| {
            e.set("code", code);
            if let Some(field_errors) = field_errors {
                if let Ok(fields) = async_graphql::Value::from_json(json!(field_errors)) {
                    e.set("fieldErrors", fields);
                }
            }
        })
    }
}

/// Shorthand for converting service results into GraphQL results
pub trait GraphQLResultExt<T> {
    fn into_gql(self) -> async_graphql::Result<T>;
}

impl<T> GraphQLResultExt<T> for Result<T, ApiError> {
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_codes_line_up() {
        assert_eq!(ApiError::authentication("x").status_code(), 401);
        assert_eq!(ApiError::authorization("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").error_code(), "NOT_FOUND");
        assert_eq!(ApiError::invalid_field("password", "too short").error_code(), "BAD_USER_INPUT");
    }

    #[test]
    fn validation_error_carries_field_errors_extension() {
        let err = ApiError::invalid_field("password", "too short").extend();
        let ext = err.extensions.as_ref().and_then(|ext| ext.get("fieldErrors")).cloned();
        let expected = async_graphql::Value::from_json(json!({ "password": "too short" })).unwrap();
        assert_eq!(ext, Some(expected));
    }

    #[test]
    fn graphql_error_carries_code_extension() {
        let err = ApiError::authorization("Operation failed").extend();
        assert_eq!(err.message, "Operation failed");
        let code = err.extensions.as_ref().and_then(|ext| ext.get("code")).cloned();
        assert_eq!(code, Some(async_graphql::Value::String("FORBIDDEN".to_string())));
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = ApiError::from(DatabaseError::UniqueViolation("Email".to_string()));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), "Email already in use");
    }
}
