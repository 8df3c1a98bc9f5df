use crate::error::ApiError;

/// Passwords shorter than this are refused before hashing
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate and bcrypt-hash a plaintext password on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::invalid_field(
            "password",
            format!("Password must be {} characters or longer", MIN_PASSWORD_LENGTH),
        ));
    }

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Unable to process password")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Unable to process password")
        })
}

/// Compare a plaintext password with a stored bcrypt digest.
pub async fn verify_password(password: String, digest: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Unable to process password")
        })?
        .map_err(|e| {
            tracing::error!("Stored password digest is unreadable: {}", e);
            ApiError::internal_server_error("Unable to process password")
        })
}
