use std::sync::Arc;

use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, AuthError};
use crate::feed::events::{PostEvent, PostEvents};
use crate::store::{Post, PostInput, PostStore, UserRecord, UserStore};
use crate::validators::{collect, is_valid_content, is_valid_image_url, is_valid_title};

/// One page of the feed
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_items: i64,
}

/// Post CRUD where only a post's creator may change or remove it
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    events: PostEvents,
    per_page: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        users: Arc<dyn UserStore>,
        events: PostEvents,
        per_page: u32,
    ) -> Self {
        Self {
            posts,
            users,
            events,
            per_page: per_page.max(1),
        }
    }

    pub fn events(&self) -> &PostEvents {
        &self.events
    }

    /// Pages are 1-based; anything below 1 is the first page.
    pub async fn list_posts(&self, page: Option<i64>) -> Result<PostPage, AppError> {
        let page = page.unwrap_or(1).max(1);
        let per_page = i64::from(self.per_page);
        let offset = (page - 1).saturating_mul(per_page);

        let total_items = self.posts.count_posts().await?;
        let posts = self.posts.list_posts(offset, per_page).await?;

        Ok(PostPage { posts, total_items })
    }

    /// The post and its creator's name, if the creator still exists
    pub async fn get_post(&self, id: Uuid) -> Result<(Post, Option<String>), AppError> {
        let post = self.find_post(id).await?;
        let creator = self.users.find_by_id(post.creator_id).await?;
        Ok((post, creator.map(|user| user.name)))
    }

    pub async fn create_post(
        &self,
        principal: &Principal,
        title: Option<&str>,
        content: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<(Post, UserRecord), AppError> {
        let input = validate_post(title, content, image_url)?;

        let creator = self
            .users
            .find_by_id(principal.user_id)
            .await?
            .ok_or(AppError::Auth(AuthError::UnknownUser))?;

        let post = self.posts.insert_post(creator.id, input).await?;
        tracing::info!(post_id = %post.id, user_id = %creator.id, "Post created");
        self.events.publish(PostEvent::Create { post: post.clone() });

        Ok((post, creator))
    }

    pub async fn update_post(
        &self,
        principal: &Principal,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Post, AppError> {
        let input = validate_post(title, content, image_url)?;
        self.owned_post(principal, id).await?;

        let post = self
            .posts
            .update_post(id, input)
            .await?
            .ok_or_else(post_not_found)?;
        tracing::info!(post_id = %post.id, user_id = %principal.user_id, "Post updated");
        self.events.publish(PostEvent::Update { post: post.clone() });

        Ok(post)
    }

    pub async fn delete_post(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        self.owned_post(principal, id).await?;

        if !self.posts.delete_post(id).await? {
            return Err(post_not_found());
        }
        tracing::info!(post_id = %id, user_id = %principal.user_id, "Post deleted");
        self.events.publish(PostEvent::Delete { post_id: id });

        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Post, AppError> {
        self.posts.find_post(id).await?.ok_or_else(post_not_found)
    }

    async fn owned_post(&self, principal: &Principal, id: Uuid) -> Result<Post, AppError> {
        let post = self.find_post(id).await?;
        if post.creator_id != principal.user_id {
            tracing::warn!(post_id = %id, user_id = %principal.user_id, "Post change by non-creator");
            return Err(AppError::Forbidden("Not authorized!".to_string()));
        }
        Ok(post)
    }
}

fn post_not_found() -> AppError {
    AppError::NotFound("Could not find post!".to_string())
}

fn validate_post(
    title: Option<&str>,
    content: Option<&str>,
    image_url: Option<&str>,
) -> Result<PostInput, AppError> {
    let mut errors = Vec::new();
    let title = collect(&mut errors, title, is_valid_title);
    let content = collect(&mut errors, content, is_valid_content);
    let image_url = collect(&mut errors, image_url, is_valid_image_url);

    match (title, content, image_url) {
        (Some(title), Some(content), Some(image_url)) => Ok(PostInput {
            title,
            content,
            image_url,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}
