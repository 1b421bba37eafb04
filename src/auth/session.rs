/// Refresh Token Session Store
///
/// Reads and writes the single refresh-token slot on a user record.
/// The slot holds the SHA-256 digest of the live refresh token, never the
/// token itself. Overwriting or clearing the slot invalidates every earlier
/// refresh token for that account, however well-formed it still is.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::{UserRecord, UserStore};

/// Hash a refresh token using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct SessionStore {
    users: Arc<dyn UserStore>,
}

impl SessionStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.find_by_email(email).await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// Whether `token` is the refresh token currently held for `record`
    pub fn is_current(record: &UserRecord, token: &str) -> bool {
        record.refresh_token.as_deref() == Some(hash_token(token).as_str())
    }

    /// Overwrite the slot with `token`, or clear it with `None`
    ///
    /// Returns `false` if the record no longer exists.
    pub async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool, AppError> {
        let digest = token.map(hash_token);
        let found = self.users.set_refresh_token(id, digest.as_deref()).await?;

        if found {
            match token {
                Some(_) => tracing::debug!(user_id = %id, "Refresh token stored"),
                None => tracing::info!(user_id = %id, "Refresh token cleared"),
            }
        }
        Ok(found)
    }

    /// Replace `presented` with `replacement` in one atomic step
    ///
    /// Returns `false` if the slot no longer holds `presented`, i.e. the
    /// token was already rotated, reused, or the account logged out.
    pub async fn rotate_refresh_token(
        &self,
        id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        let rotated = self
            .users
            .compare_and_set_refresh_token(id, &hash_token(presented), &hash_token(replacement))
            .await?;

        if !rotated {
            tracing::warn!(user_id = %id, "Refresh token rotation lost to a concurrent change");
        }
        Ok(rotated)
    }
}
