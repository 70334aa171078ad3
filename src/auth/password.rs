/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt. Hashing is CPU-bound, so both
/// operations run on the blocking thread pool.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// bcrypt cost factor
pub const HASH_COST: u32 = 10;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || hash(password, HASH_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is not a valid bcrypt hash
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_password() {
        let password = "secret1";
        let hash = hash_password(password).await.expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_same_password_gets_different_salts() {
        let first = hash_password("secret1").await.unwrap();
        let second = hash_password("secret1").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_verify_password() {
        let hash = hash_password("secret1").await.expect("Failed to hash password");

        assert!(verify_password("secret1", &hash).await.unwrap());
        assert!(!verify_password("secret2", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_against_garbage_hash() {
        assert!(verify_password("secret1", "not-a-bcrypt-hash").await.is_err());
    }
}
