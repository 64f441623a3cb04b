//! SQLite persistence for forum entities.
//!
//! Each entity collection is a table keyed by an opaque id; comment and post
//! references are stored as JSON identifier lists and resolved at read time.
//! Mutations that touch more than one row run in a transaction, and the two
//! contended writes are single statements so concurrent calls cannot lose
//! updates: view counts bump via `view_count = view_count + 1`, and child
//! list appends go through `json_insert`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

use crate::models::{Comment, Community, LinkFlair, Post};

/// Where a freshly created comment attaches.
#[derive(Debug, Clone)]
pub enum CommentParent {
    /// Top-level comment: appended to the post's root list.
    Post(String),
    /// Reply: appended to an existing comment's child list.
    Comment(String),
}

pub struct ForumDatabase {
    pool: SqlitePool,
}

impl ForumDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        Ok(ForumDatabase { pool })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                view_count INTEGER NOT NULL DEFAULT 0,
                link_flair_id TEXT,
                community_id TEXT NOT NULL,
                comment_ids TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                post_id TEXT NOT NULL,
                content TEXT NOT NULL,
                author_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                child_ids TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS communities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                members TEXT NOT NULL,
                created_at TEXT NOT NULL,
                post_ids TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS link_flairs (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        // A post's whole forest resolves from one indexed scan.
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_community ON posts(community_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ── Posts ──

    /// Inserts the post and appends it to its community's post list in one
    /// transaction, so the back-reference and the membership list can never
    /// disagree.
    pub async fn insert_post(&self, post: &Post) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO posts (id, title, content, author_name, created_at, view_count, link_flair_id, community_id, comment_ids)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author_name)
        .bind(post.created_at)
        .bind(post.view_count)
        .bind(&post.link_flair_id)
        .bind(&post.community_id)
        .bind(serde_json::to_string(&post.comment_ids)?)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            "UPDATE communities SET post_ids = json_insert(post_ids, '$[#]', ?) WHERE id = ?",
        )
        .bind(&post.id)
        .bind(&post.community_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            anyhow::bail!("community {} vanished during post creation", post.community_id);
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_post(&r)).transpose()
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_post).collect()
    }

    pub async fn list_posts_by_community(&self, community_id: &str) -> Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts WHERE community_id = ?")
            .bind(community_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_post).collect()
    }

    /// Atomic read-modify-write bump. Returns the updated row, or `None`
    /// when the post does not exist.
    pub async fn increment_views(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_post(&r)).transpose()
    }

    // ── Comments ──

    /// Inserts the comment row and appends its id to the parent's list in
    /// one transaction: either the comment lands fully attached or not at
    /// all. Returns `false` when the parent row no longer exists.
    pub async fn insert_comment(&self, comment: &Comment, parent: &CommentParent) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO comments (id, post_id, content, author_name, created_at, child_ids)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.content)
        .bind(&comment.author_name)
        .bind(comment.created_at)
        .bind(serde_json::to_string(&comment.child_ids)?)
        .execute(&mut *tx)
        .await?;

        let updated = match parent {
            CommentParent::Post(post_id) => {
                sqlx::query(
                    "UPDATE posts SET comment_ids = json_insert(comment_ids, '$[#]', ?) WHERE id = ?",
                )
                .bind(&comment.id)
                .bind(post_id)
                .execute(&mut *tx)
                .await?
            }
            CommentParent::Comment(parent_id) => {
                sqlx::query(
                    "UPDATE comments SET child_ids = json_insert(child_ids, '$[#]', ?) WHERE id = ?",
                )
                .bind(&comment.id)
                .bind(parent_id)
                .execute(&mut *tx)
                .await?
            }
        };

        if updated.rows_affected() == 0 {
            // Dropped transaction rolls back the orphan insert.
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_comment(&r)).transpose()
    }

    pub async fn list_comments_by_post(&self, post_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query("SELECT * FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_comment).collect()
    }

    // ── Communities ──

    pub async fn insert_community(&self, community: &Community) -> Result<()> {
        sqlx::query(
            "INSERT INTO communities (id, name, description, members, created_at, post_ids)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&community.id)
        .bind(&community.name)
        .bind(&community.description)
        .bind(serde_json::to_string(&community.members)?)
        .bind(community.created_at)
        .bind(serde_json::to_string(&community.post_ids)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_community(&self, id: &str) -> Result<Option<Community>> {
        let row = sqlx::query("SELECT * FROM communities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_community(&r)).transpose()
    }

    pub async fn list_communities(&self) -> Result<Vec<Community>> {
        let rows = sqlx::query("SELECT * FROM communities")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_community).collect()
    }

    // ── Link flairs ──

    pub async fn insert_flair(&self, flair: &LinkFlair) -> Result<()> {
        sqlx::query("INSERT INTO link_flairs (id, content) VALUES (?, ?)")
            .bind(&flair.id)
            .bind(&flair.content)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_flair(&self, id: &str) -> Result<Option<LinkFlair>> {
        let row = sqlx::query("SELECT * FROM link_flairs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| LinkFlair {
            id: r.get("id"),
            content: r.get("content"),
        }))
    }

    pub async fn list_flairs(&self) -> Result<Vec<LinkFlair>> {
        let rows = sqlx::query("SELECT * FROM link_flairs")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| LinkFlair {
                id: r.get("id"),
                content: r.get("content"),
            })
            .collect())
    }
}

fn row_to_post(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        view_count: row.get("view_count"),
        link_flair_id: row.get("link_flair_id"),
        community_id: row.get("community_id"),
        comment_ids: serde_json::from_str(&row.get::<String, _>("comment_ids"))?,
    })
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        content: row.get("content"),
        author_name: row.get("author_name"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        child_ids: serde_json::from_str(&row.get::<String, _>("child_ids"))?,
    })
}

fn row_to_community(row: &SqliteRow) -> Result<Community> {
    Ok(Community {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        members: serde_json::from_str(&row.get::<String, _>("members"))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        post_ids: serde_json::from_str(&row.get::<String, _>("post_ids"))?,
    })
}
