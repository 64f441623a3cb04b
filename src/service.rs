//! ForumService - the transport-agnostic operations of the forum core.
//!
//! Every operation validates input, talks to [`ForumDatabase`], and hands
//! back either stored entities or fully resolved views. HTTP handlers in
//! `routes` are thin wrappers around this type.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::comment_tree;
use crate::database::{CommentParent, ForumDatabase};
use crate::error::{AppError, AppResult};
use crate::models::{
    Comment, Community, CommunityRef, LinkFlair, Post, PostView, MAX_COMMENT_LEN,
    MAX_COMMUNITY_DESC_LEN, MAX_COMMUNITY_NAME_LEN, MAX_FLAIR_LEN, MAX_TITLE_LEN,
};
use crate::search::matches_query;
use crate::sort::{sort_posts, SortMode};
use crate::timefmt::{display_author, relative_age};

/// Input for `create_post`. `flair_id` and `new_flair_content` are mutually
/// exclusive; supplying neither leaves the post unflaired.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub community_id: String,
    pub flair_id: Option<String>,
    pub new_flair_content: Option<String>,
}

/// Input for `create_comment`. Exactly one of `post_id` (top-level comment)
/// and `parent_comment_id` (reply) must be set.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub author_name: String,
    pub post_id: Option<String>,
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub creator_username: String,
}

#[derive(Clone)]
pub struct ForumService {
    db: Arc<ForumDatabase>,
}

impl ForumService {
    pub fn new(db: Arc<ForumDatabase>) -> Self {
        Self { db }
    }

    // ── Posts ──

    pub async fn create_post(&self, input: NewPost) -> AppResult<Post> {
        let title = required_field(&input.title, "Title")?;
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title cannot exceed {} characters",
                MAX_TITLE_LEN
            )));
        }
        let content = required_field(&input.content, "Content")?;
        let author_name = required_field(&input.author_name, "Author")?;

        if input.flair_id.is_some() && input.new_flair_content.is_some() {
            return Err(AppError::Validation(
                "Ambiguous flair: supply either an existing link flair or text for a new one, not both".to_string(),
            ));
        }

        if self.db.get_community(&input.community_id).await?.is_none() {
            return Err(AppError::NotFound("Community not found".to_string()));
        }

        let link_flair_id = match (&input.flair_id, &input.new_flair_content) {
            (Some(flair_id), None) => {
                if self.db.get_flair(flair_id).await?.is_none() {
                    return Err(AppError::NotFound("Link flair not found".to_string()));
                }
                Some(flair_id.clone())
            }
            (None, Some(new_content)) => {
                let flair = self.create_link_flair(new_content).await?;
                Some(flair.id)
            }
            _ => None,
        };

        let post = Post {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            author_name,
            created_at: Utc::now(),
            view_count: 0,
            link_flair_id,
            community_id: input.community_id.clone(),
            comment_ids: Vec::new(),
        };

        self.db.insert_post(&post).await?;
        tracing::info!("Created post {} in community {}", post.id, post.community_id);
        Ok(post)
    }

    pub async fn get_post(&self, post_id: &str) -> AppResult<PostView> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        self.resolve_view(post).await
    }

    pub async fn increment_post_view(&self, post_id: &str) -> AppResult<PostView> {
        let post = self
            .db
            .increment_views(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        self.resolve_view(post).await
    }

    /// All posts, resolved. Unsorted unless a mode is given; the same
    /// engine orders every listing surface.
    pub async fn list_posts(&self, sort: Option<SortMode>) -> AppResult<Vec<PostView>> {
        let posts = self.db.list_posts().await?;
        let views = self.resolve_views(posts).await?;
        Ok(apply_sort(views, sort))
    }

    pub async fn list_community_posts(
        &self,
        community_id: &str,
        sort: Option<SortMode>,
    ) -> AppResult<Vec<PostView>> {
        if self.db.get_community(community_id).await?.is_none() {
            return Err(AppError::NotFound("Community not found".to_string()));
        }

        let posts = self.db.list_posts_by_community(community_id).await?;
        let views = self.resolve_views(posts).await?;
        Ok(apply_sort(views, sort))
    }

    /// Posts matching the query in title, content, or any comment at any
    /// depth of the forest.
    pub async fn search_posts(
        &self,
        query: &str,
        sort: Option<SortMode>,
    ) -> AppResult<Vec<PostView>> {
        let posts = self.db.list_posts().await?;
        let views = self.resolve_views(posts).await?;
        let matched = views
            .into_iter()
            .filter(|view| matches_query(view, query))
            .collect();
        Ok(apply_sort(matched, sort))
    }

    /// Total comments on a post, counting every node at every depth.
    pub async fn comment_count(&self, post_id: &str) -> AppResult<usize> {
        let view = self.get_post(post_id).await?;
        Ok(comment_tree::count_all(&view.comments))
    }

    // ── Comments ──

    pub async fn create_comment(&self, input: NewComment) -> AppResult<Comment> {
        let content = required_field(&input.content, "Comment content")?;
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!(
                "Comment cannot exceed {} characters",
                MAX_COMMENT_LEN
            )));
        }
        let author_name = required_field(&input.author_name, "Comment author")?;

        let (post_id, parent) = match (&input.post_id, &input.parent_comment_id) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(AppError::Validation(
                    "Exactly one of postId or parentCommentId must be provided".to_string(),
                ));
            }
            (Some(post_id), None) => {
                if self.db.get_post(post_id).await?.is_none() {
                    return Err(AppError::NotFound("Post not found".to_string()));
                }
                (post_id.clone(), CommentParent::Post(post_id.clone()))
            }
            (None, Some(parent_id)) => {
                let parent_comment = self
                    .db
                    .get_comment(parent_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
                (parent_comment.post_id, CommentParent::Comment(parent_id.clone()))
            }
        };

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id,
            content,
            author_name,
            created_at: Utc::now(),
            child_ids: Vec::new(),
        };

        // The parent can vanish between the existence check above and the
        // attach; the transactional insert reports that instead of leaving
        // an orphan row behind.
        if !self.db.insert_comment(&comment, &parent).await? {
            return Err(AppError::NotFound("Parent not found".to_string()));
        }

        tracing::info!("Created comment {} on post {}", comment.id, comment.post_id);
        Ok(comment)
    }

    // ── Communities ──

    pub async fn create_community(&self, input: NewCommunity) -> AppResult<Community> {
        let name = required_field(&input.name, "Community name")?;
        if name.chars().count() > MAX_COMMUNITY_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Community name cannot exceed {} characters",
                MAX_COMMUNITY_NAME_LEN
            )));
        }
        let description = required_field(&input.description, "Community description")?;
        if description.chars().count() > MAX_COMMUNITY_DESC_LEN {
            return Err(AppError::Validation(format!(
                "Community description cannot exceed {} characters",
                MAX_COMMUNITY_DESC_LEN
            )));
        }
        let creator = required_field(&input.creator_username, "Creator username")?;

        let community = Community {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            members: vec![creator],
            created_at: Utc::now(),
            post_ids: Vec::new(),
        };

        self.db.insert_community(&community).await?;
        tracing::info!("Created community {} ({})", community.name, community.id);
        Ok(community)
    }

    pub async fn get_community(&self, id: &str) -> AppResult<Community> {
        self.db
            .get_community(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Community not found".to_string()))
    }

    pub async fn list_communities(&self) -> AppResult<Vec<Community>> {
        Ok(self.db.list_communities().await?)
    }

    // ── Link flairs ──

    pub async fn create_link_flair(&self, content: &str) -> AppResult<LinkFlair> {
        let content = required_field(content, "Link flair content")?;
        if content.chars().count() > MAX_FLAIR_LEN {
            return Err(AppError::Validation(format!(
                "Link flair cannot exceed {} characters",
                MAX_FLAIR_LEN
            )));
        }

        let flair = LinkFlair {
            id: Uuid::new_v4().to_string(),
            content,
        };

        self.db.insert_flair(&flair).await?;
        Ok(flair)
    }

    pub async fn list_link_flairs(&self) -> AppResult<Vec<LinkFlair>> {
        Ok(self.db.list_flairs().await?)
    }

    // ── View resolution ──

    async fn resolve_views(&self, posts: Vec<Post>) -> AppResult<Vec<PostView>> {
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.resolve_view(post).await?);
        }
        Ok(views)
    }

    async fn resolve_view(&self, post: Post) -> AppResult<PostView> {
        let rows = self.db.list_comments_by_post(&post.id).await?;
        let stored: HashMap<String, Comment> =
            rows.into_iter().map(|c| (c.id.clone(), c)).collect();
        let comments = comment_tree::build_forest(&post.comment_ids, &stored)?;
        let comment_count = comment_tree::count_all(&comments);

        let community = match self.db.get_community(&post.community_id).await? {
            Some(community) => CommunityRef {
                id: community.id,
                name: community.name,
            },
            None => CommunityRef {
                id: post.community_id.clone(),
                name: "Unknown Community".to_string(),
            },
        };

        let link_flair = match &post.link_flair_id {
            Some(flair_id) => self.db.get_flair(flair_id).await?,
            None => None,
        };

        Ok(PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            author_name: display_author(&post.author_name).to_string(),
            created_at: post.created_at,
            created_ago: relative_age(post.created_at, Utc::now()),
            view_count: post.view_count,
            link_flair,
            community,
            comments,
            comment_count,
        })
    }
}

fn apply_sort(views: Vec<PostView>, sort: Option<SortMode>) -> Vec<PostView> {
    match sort {
        Some(mode) => sort_posts(views, mode),
        None => views,
    }
}

fn required_field(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
