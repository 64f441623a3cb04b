//! Search Matcher.
//!
//! Whitespace-split terms, case-insensitive substring match, OR semantics: a
//! post matches when any term appears in its title, its content, or any
//! comment at any depth of its forest.

use crate::comment_tree;
use crate::models::PostView;

/// Splits a raw query into lowercased terms. An empty or all-whitespace
/// query yields no terms, which by design matches nothing.
pub fn split_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// True if the post matches any term of the query. Stops scanning at the
/// first hit.
pub fn matches_query(post: &PostView, query: &str) -> bool {
    let terms = split_terms(query);
    if terms.is_empty() {
        return false;
    }

    let title = post.title.to_lowercase();
    let content = post.content.to_lowercase();

    terms.iter().any(|term| {
        title.contains(term)
            || content.contains(term)
            || comment_tree::contains_term(&post.comments, term)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentNode, CommunityRef};
    use chrono::{TimeZone, Utc};

    fn sample_post() -> PostView {
        let created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        PostView {
            id: "p1".to_string(),
            title: "Rust borrow checker tips".to_string(),
            content: "Lifetimes are not as scary as they look.".to_string(),
            author_name: "alice".to_string(),
            created_at,
            created_ago: String::new(),
            view_count: 0,
            link_flair: None,
            community: CommunityRef {
                id: "comm".to_string(),
                name: "c/rust".to_string(),
            },
            comments: vec![CommentNode {
                id: "c1".to_string(),
                content: "top-level reply".to_string(),
                author_name: "bob".to_string(),
                created_at,
                children: vec![CommentNode {
                    id: "c2".to_string(),
                    content: "nested mention of polonius".to_string(),
                    author_name: "carol".to_string(),
                    created_at,
                    children: Vec::new(),
                }],
            }],
            comment_count: 2,
        }
    }

    #[test]
    fn matches_on_title_case_insensitively() {
        assert!(matches_query(&sample_post(), "BORROW"));
    }

    #[test]
    fn matches_on_content() {
        assert!(matches_query(&sample_post(), "lifetimes"));
    }

    #[test]
    fn matches_on_deeply_nested_comment() {
        assert!(matches_query(&sample_post(), "polonius"));
    }

    #[test]
    fn any_term_is_enough() {
        assert!(matches_query(&sample_post(), "nonexistent checker"));
    }

    #[test]
    fn no_term_matches_nothing() {
        let post = sample_post();
        assert!(!matches_query(&post, ""));
        assert!(!matches_query(&post, "   \t  "));
        assert!(!matches_query(&post, "quantum"));
    }

    #[test]
    fn split_terms_lowercases_and_drops_whitespace() {
        assert_eq!(split_terms("  Rust   TIPS "), vec!["rust", "tips"]);
        assert!(split_terms("   ").is_empty());
    }
}
