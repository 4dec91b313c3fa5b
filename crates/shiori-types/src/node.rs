//! The bookmark tree node.
//!
//! Mirrors the browser's `BookmarkTreeNode`: a node is a **folder** iff `url`
//! is absent (even with zero children) and a **bookmark** iff `url` is present.

use serde::{Deserialize, Serialize};

use crate::clipboard::ItemKind;
use crate::ids::BookmarkId;

/// Title shown when a node has neither a title nor a url.
pub const UNTITLED: &str = "untitled";

/// A folder or bookmark in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: BookmarkId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BookmarkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    /// A folder with the given children.
    pub fn folder(id: impl Into<BookmarkId>, title: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            parent_id: None,
            children: Some(children),
        }
    }

    /// A bookmark pointing at `url`.
    pub fn bookmark(id: impl Into<BookmarkId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            parent_id: None,
            children: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }

    pub fn is_bookmark(&self) -> bool {
        self.url.is_some()
    }

    pub fn kind(&self) -> ItemKind {
        if self.is_folder() { ItemKind::Folder } else { ItemKind::Bookmark }
    }

    /// Children, or an empty slice for bookmarks and childless folders.
    pub fn children(&self) -> &[BookmarkNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// `title || url || "untitled"`.
    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            return &self.title;
        }
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => UNTITLED,
        }
    }

    /// Fill in `parent_id` on every descendant, recursively.
    ///
    /// Trees built by hand (tests, imports) often omit parent ids; the
    /// browser always sets them.
    pub fn with_parent_ids(mut self) -> Self {
        fn stamp(node: &mut BookmarkNode) {
            let id = node.id.clone();
            if let Some(children) = node.children.as_mut() {
                for child in children.iter_mut() {
                    child.parent_id = Some(id.clone());
                    stamp(child);
                }
            }
        }
        stamp(&mut self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_without_children_is_still_a_folder() {
        let node = BookmarkNode {
            id: "5".into(),
            title: "Empty".into(),
            url: None,
            parent_id: None,
            children: None,
        };
        assert!(node.is_folder());
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_display_title_fallback_chain() {
        let titled = BookmarkNode::bookmark("1", "Docs", "https://docs.rs");
        assert_eq!(titled.display_title(), "Docs");

        let url_only = BookmarkNode::bookmark("2", "", "https://docs.rs");
        assert_eq!(url_only.display_title(), "https://docs.rs");

        let bare = BookmarkNode::folder("3", "", vec![]);
        assert_eq!(bare.display_title(), UNTITLED);
    }

    #[test]
    fn test_deserializes_browser_shape() {
        let json = r#"{"id":"1","title":"Bar","parentId":"0","children":[{"id":"2","title":"x","url":"https://x","parentId":"1","index":0}]}"#;
        let node: BookmarkNode = serde_json::from_str(json).unwrap();
        assert!(node.is_folder());
        assert_eq!(node.children()[0].url.as_deref(), Some("https://x"));
        assert_eq!(node.children()[0].parent_id.as_ref().unwrap(), "1");
    }
}
