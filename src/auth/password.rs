/// Password Hashing and Verification
///
/// bcrypt with a configurable cost factor. Both calls are CPU-bound, so the
/// async wrappers move them onto tokio's blocking pool.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if the cost is out of range or bcrypt fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is not a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = bcrypt::DEFAULT_COST - 8;

    #[test]
    fn test_hash_password() {
        let password = "secret1";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("secret1", TEST_COST).expect("Failed to hash password");

        let is_valid = verify_password("secret1", &hash).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_single_character_mutations_fail() {
        let password = "secret1";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        for mutated in ["secret2", "Secret1", "secret", "secret1!", "sxcret1"] {
            let is_valid = verify_password(mutated, &hash).expect("Failed to verify password");
            assert!(!is_valid, "{} should not match", mutated);
        }
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let a = hash_password("secret1", TEST_COST).unwrap();
        let b = hash_password("secret1", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_cost() {
        assert!(hash_password("secret1", 3).is_err());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("secret1", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("secret1".into(), TEST_COST).await.unwrap();
        assert!(verify_password_blocking("secret1".into(), hash).await.unwrap());
    }
}
