//! Bookmark search.

use serde::Serialize;

use shiori_types::{BookmarkId, BookmarkNode};

/// Most results a search returns.
pub const MAX_RESULTS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Title,
    Url,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
    /// Folder titles leading to the bookmark, synthetic root excluded.
    pub path: Vec<String>,
    pub match_kind: MatchKind,
}

impl SearchHit {
    pub fn path_string(&self) -> String {
        self.path.join(" / ")
    }
}

/// Case-insensitive substring search over bookmark titles, then urls.
///
/// Folders are never hits. Results keep tree order and stop at
/// [`MAX_RESULTS`]. A blank query matches nothing.
pub fn search(tree: &[BookmarkNode], query: &str) -> Vec<SearchHit> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let mut hits = Vec::new();
    let mut stack: Vec<(&BookmarkNode, Vec<String>)> =
        tree.iter().rev().map(|n| (n, Vec::new())).collect();

    while let Some((node, path)) = stack.pop() {
        if let Some(url) = node.url.as_deref() {
            let kind = if node.title.to_lowercase().contains(&needle) {
                Some(MatchKind::Title)
            } else if url.to_lowercase().contains(&needle) {
                Some(MatchKind::Url)
            } else {
                None
            };
            if let Some(match_kind) = kind {
                hits.push(SearchHit {
                    id: node.id.clone(),
                    title: node.display_title().to_string(),
                    url: url.to_string(),
                    path: path.clone(),
                    match_kind,
                });
                if hits.len() >= MAX_RESULTS {
                    break;
                }
            }
        }

        let mut child_path = path;
        if !node.id.is_root() {
            child_path.push(node.title.clone());
        }
        for child in node.children().iter().rev() {
            stack.push((child, child_path.clone()));
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::sample_tree;

    #[test]
    fn test_title_before_url() {
        let hits = search(&sample_tree(), "BOOK");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].match_kind, MatchKind::Title);
        assert_eq!(hits[0].path, ["Bar", "Docs", "Rust"]);
        assert_eq!(hits[0].path_string(), "Bar / Docs / Rust");

        let hits = search(&sample_tree(), "rust-lang");
        assert_eq!(hits[0].match_kind, MatchKind::Url);
    }

    #[test]
    fn test_folders_never_match_and_blank_is_empty() {
        assert!(search(&sample_tree(), "Docs").is_empty());
        assert!(search(&sample_tree(), "   ").is_empty());
    }

    #[test]
    fn test_results_keep_tree_order_and_cap() {
        let hits: Vec<_> = search(&sample_tree(), "https")
            .into_iter()
            .map(|h| h.id.into_inner())
            .collect();
        assert_eq!(hits, ["2", "3", "6"]);

        let many: Vec<BookmarkNode> = (0..80)
            .map(|i| BookmarkNode::bookmark(i.to_string(), format!("site {i}"), "https://example.com"))
            .collect();
        let tree = vec![BookmarkNode::folder("0", "", vec![BookmarkNode::folder("1", "Bar", many)])];
        assert_eq!(search(&tree, "site").len(), MAX_RESULTS);
    }
}
