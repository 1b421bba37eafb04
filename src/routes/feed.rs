/// Feed Routes
///
/// Every route here sits behind the access-token gate.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::AppError;
use crate::feed::FeedService;
use crate::store::Post;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub posts: Vec<Post>,
    pub total_items: i64,
}

#[derive(Serialize)]
pub struct PostResponse {
    pub message: &'static str,
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

#[derive(Serialize)]
pub struct CreatorSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct CreatedPostResponse {
    pub message: &'static str,
    pub post: Post,
    pub creator: CreatorSummary,
}

#[derive(Serialize)]
pub struct DeletedPostResponse {
    pub message: &'static str,
}

/// GET /feed/posts?page=N
pub async fn get_posts(
    query: web::Query<PageQuery>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, AppError> {
    let page = feed.list_posts(query.page).await?;

    Ok(HttpResponse::Ok().json(PostsResponse {
        posts: page.posts,
        total_items: page.total_items,
    }))
}

/// GET /feed/post/{post_id}
pub async fn get_post(
    post_id: web::Path<Uuid>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, AppError> {
    let (post, creator) = feed.get_post(post_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PostResponse {
        message: "Post fetched",
        post,
        creator,
    }))
}

/// POST /feed/post
pub async fn create_post(
    principal: web::ReqData<Principal>,
    form: web::Json<PostRequest>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, AppError> {
    let (post, creator) = feed
        .create_post(
            &principal,
            form.title.as_deref(),
            form.content.as_deref(),
            form.image_url.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(CreatedPostResponse {
        message: "Post created successfully!",
        post,
        creator: CreatorSummary {
            id: creator.id,
            name: creator.name,
        },
    }))
}

/// PUT /feed/post/{post_id}
///
/// # Errors
/// - 422: Invalid fields
/// - 404: No such post
/// - 403: Caller is not the post's creator
pub async fn update_post(
    principal: web::ReqData<Principal>,
    post_id: web::Path<Uuid>,
    form: web::Json<PostRequest>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, AppError> {
    let post = feed
        .update_post(
            &principal,
            post_id.into_inner(),
            form.title.as_deref(),
            form.content.as_deref(),
            form.image_url.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(PostResponse {
        message: "Post updated successfully!",
        post,
        creator: None,
    }))
}

/// DELETE /feed/post/{post_id}
pub async fn delete_post(
    principal: web::ReqData<Principal>,
    post_id: web::Path<Uuid>,
    feed: web::Data<FeedService>,
) -> Result<HttpResponse, AppError> {
    feed.delete_post(&principal, post_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(DeletedPostResponse {
        message: "Post deleted successfully.",
    }))
}
