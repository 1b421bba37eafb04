/// Record stores
///
/// Contracts for the user and post records the service reads and writes,
/// with a Postgres backend for deployment and an in-memory backend for
/// tests and local runs. Every mutation is awaited by the caller and its
/// failure surfaces as a `DatabaseError`.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Status every new account starts with
pub const DEFAULT_STATUS: &str = "I am new!";

/// A user's credential record
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Digest of the one live refresh token, if any
    pub refresh_token: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a creator may set on a post
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub image_url: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new record with no refresh token and the default status
    ///
    /// # Errors
    /// `UniqueConstraintViolation` if the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, DatabaseError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError>;

    /// Unconditionally overwrite the stored refresh token.
    /// Returns `false` if no record has this id.
    async fn set_refresh_token(
        &self,
        id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<bool, DatabaseError>;

    /// Replace the stored refresh token only if it still equals `expected`.
    /// Returns `false` if the record is gone or holds a different value.
    async fn compare_and_set_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, DatabaseError>;

    /// Returns `false` if no record has this id.
    async fn set_status(&self, id: Uuid, status: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn count_posts(&self) -> Result<i64, DatabaseError>;

    /// Posts in creation order
    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>, DatabaseError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, DatabaseError>;

    async fn insert_post(&self, creator_id: Uuid, post: PostInput) -> Result<Post, DatabaseError>;

    /// Returns `None` if the post no longer exists.
    async fn update_post(&self, id: Uuid, post: PostInput) -> Result<Option<Post>, DatabaseError>;

    /// Returns `false` if the post no longer exists.
    async fn delete_post(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
