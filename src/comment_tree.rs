//! Comment Tree Model.
//!
//! Comments persist as flat rows whose `child_ids` lists form a forest per
//! post. This module resolves those rows into owned [`CommentNode`] trees and
//! provides the traversals everything else is built on: recursive counting,
//! latest-activity scans, chronological render order, and term search.
//!
//! Traversals over resolved trees use an explicit stack, so tree depth never
//! translates into call-stack depth. Resolution itself recurses but is bounded
//! by [`MAX_TREE_DEPTH`], which doubles as the cycle guard: a cyclic set of
//! stored references cannot resolve without blowing past it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};
use crate::models::{Comment, CommentNode};
use crate::timefmt;

/// Nesting level at which rendering stops indenting. Presentational only:
/// deeper nodes are still traversed and counted normally.
pub const DISPLAY_DEPTH_LIMIT: usize = 8;

/// Hard bound on resolution depth. Stored forests deeper than this indicate
/// corrupted or cyclic child lists and are rejected as a storage error.
pub const MAX_TREE_DEPTH: usize = 1_000;

/// Resolves the stored rows of one post into an owned forest.
///
/// `roots` are the post's top-level comment ids; `stored` must hold every
/// comment row belonging to the post. A reference to a missing row or a
/// forest deeper than [`MAX_TREE_DEPTH`] is a storage error, never a panic.
pub fn build_forest(
    roots: &[String],
    stored: &HashMap<String, Comment>,
) -> AppResult<Vec<CommentNode>> {
    roots.iter().map(|id| build_node(id, stored, 0)).collect()
}

fn build_node(
    id: &str,
    stored: &HashMap<String, Comment>,
    depth: usize,
) -> AppResult<CommentNode> {
    if depth > MAX_TREE_DEPTH {
        return Err(AppError::Storage(format!(
            "comment forest exceeds depth {} (cyclic child references?)",
            MAX_TREE_DEPTH
        )));
    }

    let comment = stored.get(id).ok_or_else(|| {
        AppError::Storage(format!("dangling comment reference: {}", id))
    })?;

    let children = comment
        .child_ids
        .iter()
        .map(|child_id| build_node(child_id, stored, depth + 1))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(CommentNode {
        id: comment.id.clone(),
        content: comment.content.clone(),
        author_name: timefmt::display_author(&comment.author_name).to_string(),
        created_at: comment.created_at,
        children,
    })
}

/// Counts every node in the forest, at every depth.
pub fn count_all(forest: &[CommentNode]) -> usize {
    let mut count = 0;
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        count += 1;
        stack.extend(node.children.iter());
    }
    count
}

/// The newest `created_at` anywhere in the forest, or `None` if it is empty.
pub fn latest_activity(forest: &[CommentNode]) -> Option<DateTime<Utc>> {
    let mut latest: Option<DateTime<Utc>> = None;
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        if latest.map_or(true, |ts| node.created_at > ts) {
            latest = Some(node.created_at);
        }
        stack.extend(node.children.iter());
    }
    latest
}

/// Depth-first display order: at every level siblings come newest-first.
///
/// The reported depth is clamped at [`DISPLAY_DEPTH_LIMIT`]; traversal is
/// not, so every node appears exactly once regardless of nesting.
pub fn render_order(forest: &[CommentNode]) -> Vec<(&CommentNode, usize)> {
    let mut ordered = Vec::new();
    let mut stack: Vec<(&CommentNode, usize)> = Vec::new();

    // Reverse-push so the newest sibling pops first.
    for node in newest_first(forest).into_iter().rev() {
        stack.push((node, 0));
    }

    while let Some((node, depth)) = stack.pop() {
        ordered.push((node, depth.min(DISPLAY_DEPTH_LIMIT)));
        for child in newest_first(&node.children).into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    ordered
}

fn newest_first(nodes: &[CommentNode]) -> Vec<&CommentNode> {
    let mut refs: Vec<&CommentNode> = nodes.iter().collect();
    refs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    refs
}

/// True if any comment in the forest contains `term` (already lowercased)
/// as a case-insensitive substring. Short-circuits on the first hit.
pub fn contains_term(forest: &[CommentNode], term: &str) -> bool {
    let mut stack: Vec<&CommentNode> = forest.iter().collect();
    while let Some(node) = stack.pop() {
        if node.content.to_lowercase().contains(term) {
            return true;
        }
        stack.extend(node.children.iter());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn node(id: &str, secs: i64, children: Vec<CommentNode>) -> CommentNode {
        CommentNode {
            id: id.to_string(),
            content: format!("comment {}", id),
            author_name: "tester".to_string(),
            created_at: ts(secs),
            children,
        }
    }

    fn stored(id: &str, child_ids: &[&str]) -> Comment {
        Comment {
            id: id.to_string(),
            post_id: "p1".to_string(),
            content: format!("comment {}", id),
            author_name: "tester".to_string(),
            created_at: ts(0),
            child_ids: child_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn build_forest_resolves_nested_children() {
        let mut rows = HashMap::new();
        rows.insert("a".to_string(), stored("a", &["b"]));
        rows.insert("b".to_string(), stored("b", &["c"]));
        rows.insert("c".to_string(), stored("c", &[]));

        let forest = build_forest(&["a".to_string()], &rows).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children[0].children[0].id, "c");
    }

    #[test]
    fn build_forest_rejects_dangling_reference() {
        let mut rows = HashMap::new();
        rows.insert("a".to_string(), stored("a", &["missing"]));

        let err = build_forest(&["a".to_string()], &rows).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn build_forest_rejects_cycles() {
        let mut rows = HashMap::new();
        rows.insert("a".to_string(), stored("a", &["b"]));
        rows.insert("b".to_string(), stored("b", &["a"]));

        let err = build_forest(&["a".to_string()], &rows).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn blank_author_resolves_to_anonymous() {
        // Creation validates authors, but resolution must not trust old rows.
        let mut row = stored("a", &[]);
        row.author_name = "   ".to_string();
        let mut rows = HashMap::new();
        rows.insert("a".to_string(), row);

        let forest = build_forest(&["a".to_string()], &rows).unwrap();
        assert_eq!(forest[0].author_name, "Anonymous");
    }

    #[test]
    fn count_all_covers_every_depth() {
        let forest = vec![
            node("a", 1, vec![node("b", 2, vec![node("c", 3, vec![])])]),
            node("d", 4, vec![]),
        ];
        assert_eq!(count_all(&forest), 4);
        assert_eq!(count_all(&[]), 0);
    }

    #[test]
    fn count_all_handles_deep_chains() {
        // Deeper than any sane nesting; explicit stack must not recurse.
        let mut chain = node("leaf", 0, vec![]);
        for i in 1..=MAX_TREE_DEPTH {
            chain = node(&format!("n{}", i), i as i64, vec![chain]);
        }
        assert_eq!(count_all(&[chain]), MAX_TREE_DEPTH + 1);
    }

    #[test]
    fn latest_activity_finds_deep_maximum() {
        let forest = vec![
            node("a", 10, vec![node("b", 50, vec![])]),
            node("c", 20, vec![]),
        ];
        assert_eq!(latest_activity(&forest), Some(ts(50)));
        assert_eq!(latest_activity(&[]), None);
    }

    #[test]
    fn render_order_sorts_siblings_newest_first_at_every_level() {
        let forest = vec![
            node("old", 1, vec![node("child_old", 2, vec![]), node("child_new", 9, vec![])]),
            node("new", 5, vec![]),
        ];

        let ordered: Vec<(&str, usize)> = render_order(&forest)
            .into_iter()
            .map(|(n, d)| (n.id.as_str(), d))
            .collect();

        assert_eq!(
            ordered,
            vec![
                ("new", 0),
                ("old", 0),
                ("child_new", 1),
                ("child_old", 1),
            ]
        );
    }

    #[test]
    fn render_order_clamps_depth_but_traverses_everything() {
        let mut chain = node("deepest", 0, vec![]);
        for i in 1..=12 {
            chain = node(&format!("n{}", i), i, vec![chain]);
        }

        let forest = [chain];
        let ordered = render_order(&forest);
        assert_eq!(ordered.len(), 13);
        assert_eq!(ordered.first().unwrap().1, 0);
        // Depth readings never exceed the display limit.
        assert!(ordered.iter().all(|(_, d)| *d <= DISPLAY_DEPTH_LIMIT));
        assert_eq!(ordered.last().unwrap().0.id, "deepest");
        assert_eq!(ordered.last().unwrap().1, DISPLAY_DEPTH_LIMIT);
    }

    #[test]
    fn contains_term_descends_into_replies() {
        let forest = vec![node(
            "a",
            1,
            vec![node("b", 2, vec![node("c", 3, vec![])])],
        )];
        assert!(contains_term(&forest, "comment c"));
        assert!(!contains_term(&forest, "absent"));
    }
}
