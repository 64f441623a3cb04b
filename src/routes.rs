//! HTTP surface: request/response shapes and the axum router.
//!
//! Paths mirror the original JSON API. Handlers stay thin; all semantics
//! live in [`ForumService`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::models::{Comment, Community, LinkFlair, Post, PostView};
use crate::service::{ForumService, NewComment, NewCommunity, NewPost};
use crate::sort::SortMode;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub sort: Option<SortMode>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub sort: Option<SortMode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub community_id: String,
    pub flair_id: Option<String>,
    pub new_flair_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub author_name: String,
    pub post_id: Option<String>,
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommunityRequest {
    pub name: String,
    pub description: String,
    pub creator_username: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkFlairRequest {
    pub content: String,
}

pub fn create_forum_router(service: ForumService) -> Router {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/{post_id}", get(get_post))
        .route("/api/posts/{post_id}/views", patch(increment_post_views))
        .route("/api/posts/{post_id}/comments/count", get(comment_count))
        .route("/api/comments", post(create_comment))
        .route("/api/communities", get(list_communities).post(create_community))
        .route("/api/communities/{community_id}", get(get_community))
        .route("/api/communities/{community_id}/posts", get(list_community_posts))
        .route("/api/linkflairs", get(list_link_flairs).post(create_link_flair))
        .route("/api/search", get(search_posts))
        .with_state(service)
}

async fn list_posts(
    State(service): State<ForumService>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<PostView>>> {
    let posts = service.list_posts(query.sort).await?;
    Ok(Json(posts))
}

async fn get_post(
    State(service): State<ForumService>,
    Path(post_id): Path<String>,
) -> AppResult<Json<PostView>> {
    let post = service.get_post(&post_id).await?;
    Ok(Json(post))
}

async fn increment_post_views(
    State(service): State<ForumService>,
    Path(post_id): Path<String>,
) -> AppResult<Json<PostView>> {
    let post = service.increment_post_view(&post_id).await?;
    Ok(Json(post))
}

async fn comment_count(
    State(service): State<ForumService>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Value>> {
    let count = service.comment_count(&post_id).await?;
    Ok(Json(json!({ "count": count })))
}

async fn create_post(
    State(service): State<ForumService>,
    Json(request): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    tracing::info!("Creating post '{}' by {}", request.title, request.author_name);
    let post = service
        .create_post(NewPost {
            title: request.title,
            content: request.content,
            author_name: request.author_name,
            community_id: request.community_id,
            flair_id: request.flair_id,
            new_flair_content: request.new_flair_content,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn create_comment(
    State(service): State<ForumService>,
    Json(request): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = service
        .create_comment(NewComment {
            content: request.content,
            author_name: request.author_name,
            post_id: request.post_id,
            parent_comment_id: request.parent_comment_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_communities(
    State(service): State<ForumService>,
) -> AppResult<Json<Vec<Community>>> {
    let communities = service.list_communities().await?;
    Ok(Json(communities))
}

async fn get_community(
    State(service): State<ForumService>,
    Path(community_id): Path<String>,
) -> AppResult<Json<Community>> {
    let community = service.get_community(&community_id).await?;
    Ok(Json(community))
}

async fn list_community_posts(
    State(service): State<ForumService>,
    Path(community_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<PostView>>> {
    let posts = service.list_community_posts(&community_id, query.sort).await?;
    Ok(Json(posts))
}

async fn create_community(
    State(service): State<ForumService>,
    Json(request): Json<CreateCommunityRequest>,
) -> AppResult<(StatusCode, Json<Community>)> {
    tracing::info!("Creating community '{}'", request.name);
    let community = service
        .create_community(NewCommunity {
            name: request.name,
            description: request.description,
            creator_username: request.creator_username,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(community)))
}

async fn list_link_flairs(
    State(service): State<ForumService>,
) -> AppResult<Json<Vec<LinkFlair>>> {
    let flairs = service.list_link_flairs().await?;
    Ok(Json(flairs))
}

async fn create_link_flair(
    State(service): State<ForumService>,
    Json(request): Json<CreateLinkFlairRequest>,
) -> AppResult<(StatusCode, Json<LinkFlair>)> {
    let flair = service.create_link_flair(&request.content).await?;
    Ok((StatusCode::CREATED, Json(flair)))
}

async fn search_posts(
    State(service): State<ForumService>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<PostView>>> {
    let posts = service.search_posts(&query.q, query.sort).await?;
    Ok(Json(posts))
}
