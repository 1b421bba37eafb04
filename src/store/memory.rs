use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, Post, PostInput, PostStore, UserRecord, UserStore, DEFAULT_STATUS};
use crate::error::DatabaseError;

/// Process-local store
///
/// Each operation takes the lock once, so a compare-and-set is atomic with
/// respect to every other call and reads observe all completed writes.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    posts: RwLock<Vec<Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users_email_key".to_string(),
            ));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            refresh_token: None,
            status: DEFAULT_STATUS.to_string(),
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.refresh_token = refresh_token.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn compare_and_set_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, DatabaseError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == Some(expected) => {
                user.refresh_token = Some(replacement.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_status(&self, id: Uuid, status: &str) -> Result<bool, DatabaseError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn count_posts(&self) -> Result<i64, DatabaseError> {
        Ok(self.posts.read().await.len() as i64)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>, DatabaseError> {
        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, DatabaseError> {
        Ok(self.posts.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_post(&self, creator_id: Uuid, post: PostInput) -> Result<Post, DatabaseError> {
        let now = Utc::now();
        let record = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            creator_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, id: Uuid, post: PostInput) -> Result<Option<Post>, DatabaseError> {
        let mut posts = self.posts.write().await;
        Ok(posts.iter_mut().find(|p| p.id == id).map(|existing| {
            existing.title = post.title;
            existing.content = post.content;
            existing.image_url = post.image_url;
            existing.updated_at = Utc::now();
            existing.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
        }
    }

    fn post_input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "Some content".to_string(),
            image_url: "images/a.png".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("ann@x.com")).await.unwrap();

        assert!(user.refresh_token.is_none());
        assert_eq!(user.status, DEFAULT_STATUS);
        assert!(matches!(
            store.insert_user(new_user("ann@x.com")).await,
            Err(DatabaseError::UniqueConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn reads_observe_writes() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("ann@x.com")).await.unwrap();

        assert!(store.set_refresh_token(user.id, Some("r1")).await.unwrap());
        let found = store.find_by_email("ann@x.com").await.unwrap().unwrap();
        assert_eq!(found.refresh_token.as_deref(), Some("r1"));

        assert!(store.set_refresh_token(user.id, None).await.unwrap());
        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(found.refresh_token.is_none());
    }

    #[tokio::test]
    async fn compare_and_set_only_replaces_expected_value() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("ann@x.com")).await.unwrap();
        store.set_refresh_token(user.id, Some("r1")).await.unwrap();

        assert!(store.compare_and_set_refresh_token(user.id, "r1", "r2").await.unwrap());
        assert!(!store.compare_and_set_refresh_token(user.id, "r1", "r3").await.unwrap());

        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.refresh_token.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn compare_and_set_fails_after_logout() {
        let store = InMemoryStore::new();
        let user = store.insert_user(new_user("ann@x.com")).await.unwrap();
        store.set_refresh_token(user.id, Some("r1")).await.unwrap();
        store.set_refresh_token(user.id, None).await.unwrap();

        assert!(!store.compare_and_set_refresh_token(user.id, "r1", "r2").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_ids_report_false() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();

        assert!(!store.set_refresh_token(id, None).await.unwrap());
        assert!(!store.set_status(id, "busy").await.unwrap());
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn posts_page_in_creation_order() {
        let store = InMemoryStore::new();
        let creator = Uuid::new_v4();
        for title in ["first", "second", "third"] {
            store.insert_post(creator, post_input(title)).await.unwrap();
        }

        assert_eq!(store.count_posts().await.unwrap(), 3);
        let page: Vec<_> = store
            .list_posts(2, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(page, vec!["third"]);
    }

    #[tokio::test]
    async fn update_and_delete_posts() {
        let store = InMemoryStore::new();
        let post = store.insert_post(Uuid::new_v4(), post_input("first")).await.unwrap();

        let updated = store
            .update_post(post.id, post_input("renamed"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.created_at, post.created_at);

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(!store.delete_post(post.id).await.unwrap());
        assert!(store.update_post(post.id, post_input("gone")).await.unwrap().is_none());
    }
}
