//! Stored entities and resolved read-time views.
//!
//! Stored entities mirror the persisted layout: each collection is keyed by
//! an opaque identifier and cross-references are identifier lists, resolved
//! into owned trees at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comment_tree;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 500;
pub const MAX_COMMUNITY_NAME_LEN: usize = 100;
pub const MAX_COMMUNITY_DESC_LEN: usize = 500;
pub const MAX_FLAIR_LEN: usize = 30;

/// A stored post. `comment_ids` holds only the roots of the comment forest;
/// `community_id` is the back-reference to the owning community.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub view_count: i64,
    pub link_flair_id: Option<String>,
    pub community_id: String,
    pub comment_ids: Vec<String>,
}

/// A stored comment. `child_ids` is append-only; insertion order carries no
/// meaning, display order is computed at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub child_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: String,
    pub name: String,
    pub description: String,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub post_ids: Vec<String>,
}

impl Community {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkFlair {
    pub id: String,
    pub content: String,
}

/// One node of a resolved comment forest, with owned children.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub children: Vec<CommentNode>,
}

/// The community slice embedded in post views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRef {
    pub id: String,
    pub name: String,
}

/// A post with its comment forest and references fully resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub created_ago: String,
    pub view_count: i64,
    pub link_flair: Option<LinkFlair>,
    pub community: CommunityRef,
    pub comments: Vec<CommentNode>,
    pub comment_count: usize,
}

impl PostView {
    /// The timestamp of the most recent activity on this post: its own
    /// creation if the forest is empty, otherwise the newest comment at
    /// any depth.
    pub fn last_activity(&self) -> DateTime<Utc> {
        match comment_tree::latest_activity(&self.comments) {
            Some(ts) => ts.max(self.created_at),
            None => self.created_at,
        }
    }
}
