//! Sort/Filter Engine.
//!
//! One shared implementation serves all three listing surfaces (global,
//! per-community, search results) so they can never drift apart.

use serde::Deserialize;

use crate::models::PostView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Newest,
    Oldest,
    Active,
}

/// Orders posts by the given mode.
///
/// Newest/Oldest compare creation time; Active compares the most recent
/// activity anywhere in each post's comment forest, breaking ties on
/// creation time (newest first). The sort is stable, so posts with fully
/// equal keys keep their input order.
pub fn sort_posts(mut posts: Vec<PostView>, mode: SortMode) -> Vec<PostView> {
    match mode {
        SortMode::Newest => {
            posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        SortMode::Oldest => {
            posts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        SortMode::Active => {
            posts.sort_by(|a, b| {
                b.last_activity()
                    .cmp(&a.last_activity())
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
        }
    }
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentNode, CommunityRef};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn post(id: &str, created_secs: i64, comment_secs: &[i64]) -> PostView {
        let comments = comment_secs
            .iter()
            .enumerate()
            .map(|(i, secs)| CommentNode {
                id: format!("{}-c{}", id, i),
                content: "reply".to_string(),
                author_name: "tester".to_string(),
                created_at: ts(*secs),
                children: Vec::new(),
            })
            .collect::<Vec<_>>();
        let comment_count = comments.len();

        PostView {
            id: id.to_string(),
            title: format!("post {}", id),
            content: "body".to_string(),
            author_name: "tester".to_string(),
            created_at: ts(created_secs),
            created_ago: String::new(),
            view_count: 0,
            link_flair: None,
            community: CommunityRef {
                id: "comm".to_string(),
                name: "c/test".to_string(),
            },
            comments,
            comment_count,
        }
    }

    fn ids(posts: &[PostView]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn newest_orders_by_creation_descending() {
        let sorted = sort_posts(vec![post("p1", 10, &[]), post("p2", 20, &[])], SortMode::Newest);
        assert_eq!(ids(&sorted), vec!["p2", "p1"]);
    }

    #[test]
    fn oldest_orders_by_creation_ascending() {
        let sorted = sort_posts(vec![post("p2", 20, &[]), post("p1", 10, &[])], SortMode::Oldest);
        assert_eq!(ids(&sorted), vec!["p1", "p2"]);
    }

    #[test]
    fn active_prefers_recent_comment_activity() {
        // p1 is older but has a fresh reply; p2 is newer and silent.
        let sorted = sort_posts(
            vec![post("p2", 20, &[]), post("p1", 10, &[90])],
            SortMode::Active,
        );
        assert_eq!(ids(&sorted), vec!["p1", "p2"]);
    }

    #[test]
    fn active_breaks_activity_ties_on_creation() {
        // Both last active at t=50; the newer post wins the tie.
        let sorted = sort_posts(
            vec![post("p1", 10, &[50]), post("p2", 30, &[50])],
            SortMode::Active,
        );
        assert_eq!(ids(&sorted), vec!["p2", "p1"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        for mode in [SortMode::Newest, SortMode::Oldest, SortMode::Active] {
            let input = vec![post("p1", 10, &[70]), post("p2", 30, &[]), post("p3", 20, &[40])];
            let once = sort_posts(input, mode);
            let twice = sort_posts(once.clone(), mode);
            assert_eq!(ids(&once), ids(&twice));
        }
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let sorted = sort_posts(
            vec![post("first", 10, &[]), post("second", 10, &[])],
            SortMode::Newest,
        );
        assert_eq!(ids(&sorted), vec!["first", "second"]);
    }
}
