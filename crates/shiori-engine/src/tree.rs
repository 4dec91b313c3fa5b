//! Pure queries over a bookmark tree.
//!
//! The tree is replaced wholesale on every refresh, so nothing here caches
//! across calls. Parent lookups that need to be fast go through
//! [`TreeIndex`], a flat arena rebuilt from a tree in one pass.

use std::collections::HashMap;

use serde::Serialize;

use shiori_types::{BookmarkId, BookmarkNode};

/// Depth-first search for `id` among `nodes` and their descendants.
pub fn find_by_id<'a>(nodes: &'a [BookmarkNode], id: Option<&BookmarkId>) -> Option<&'a BookmarkNode> {
    let id = id?;
    nodes.iter().find_map(|node| find_in(node, id))
}

fn find_in<'a>(node: &'a BookmarkNode, id: &BookmarkId) -> Option<&'a BookmarkNode> {
    if &node.id == id {
        return Some(node);
    }
    node.children().iter().find_map(|c| find_in(c, id))
}

/// Inclusive path from a top node down to `target`, or `None` if unreachable.
///
/// For a full `get_tree()` result the first element is the synthetic root.
pub fn find_path<'a>(nodes: &'a [BookmarkNode], target: &BookmarkId) -> Option<Vec<&'a BookmarkNode>> {
    fn walk<'a>(node: &'a BookmarkNode, target: &BookmarkId, path: &mut Vec<&'a BookmarkNode>) -> bool {
        path.push(node);
        if &node.id == target || node.children().iter().any(|c| walk(c, target, path)) {
            return true;
        }
        path.pop();
        false
    }

    let mut path = Vec::new();
    let found = nodes.iter().any(|node| walk(node, target, &mut path));
    found.then_some(path)
}

/// Children of the synthetic root.
pub fn top_level_nodes(tree: &[BookmarkNode]) -> &[BookmarkNode] {
    tree.first().map(BookmarkNode::children).unwrap_or(&[])
}

/// `title || url || "untitled"`.
pub fn display_title(node: &BookmarkNode) -> &str {
    node.display_title()
}

/// Parent of `id` according to `path`: the second-to-last element, or
/// `None` (the top-level view) when the path is too short to have one below
/// the synthetic root.
pub fn parent_from_path(path: &[&BookmarkNode]) -> Option<BookmarkId> {
    if path.len() <= 2 {
        return None;
    }
    Some(path[path.len() - 2].id.clone())
}

// ============================================================================
// Arena index
// ============================================================================

#[derive(Debug)]
struct Slot {
    id: BookmarkId,
    parent: Option<usize>,
}

/// Flat index of a tree: O(1) parent lookup without back-pointers.
#[derive(Debug, Default)]
pub struct TreeIndex {
    slots: Vec<Slot>,
    by_id: HashMap<BookmarkId, usize>,
}

impl TreeIndex {
    pub fn build(tree: &[BookmarkNode]) -> Self {
        let mut index = Self::default();
        let mut stack: Vec<(&BookmarkNode, Option<usize>)> =
            tree.iter().rev().map(|n| (n, None)).collect();
        while let Some((node, parent)) = stack.pop() {
            let slot = index.slots.len();
            index.slots.push(Slot {
                id: node.id.clone(),
                parent,
            });
            index.by_id.insert(node.id.clone(), slot);
            stack.extend(node.children().iter().rev().map(|c| (c, Some(slot))));
        }
        index
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Parent id, or `None` for top nodes and unknown ids.
    pub fn parent_of(&self, id: &BookmarkId) -> Option<&BookmarkId> {
        let slot = &self.slots[*self.by_id.get(id)?];
        slot.parent.map(|p| &self.slots[p].id)
    }

    /// `id` followed by each ancestor up to the top. Empty for unknown ids.
    pub fn ancestors(&self, id: &BookmarkId) -> Vec<BookmarkId> {
        let mut chain = Vec::new();
        let mut cursor = self.by_id.get(id).copied();
        while let Some(i) = cursor {
            chain.push(self.slots[i].id.clone());
            cursor = self.slots[i].parent;
        }
        chain
    }

    /// True if `ancestor` is `id` or lies on its path to the top.
    pub fn is_self_or_ancestor(&self, ancestor: &BookmarkId, id: &BookmarkId) -> bool {
        self.ancestors(id).iter().any(|a| a == ancestor)
    }
}

// ============================================================================
// Folder listing
// ============================================================================

/// One row of a folder picker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    pub id: BookmarkId,
    pub title: String,
    /// 0 for top-level containers.
    pub depth: usize,
}

/// Every folder below the synthetic root, depth-first, with its depth.
pub fn folders(tree: &[BookmarkNode]) -> Vec<FolderEntry> {
    fn walk(node: &BookmarkNode, depth: usize, out: &mut Vec<FolderEntry>) {
        if !node.is_folder() {
            return;
        }
        out.push(FolderEntry {
            id: node.id.clone(),
            title: node.display_title().to_string(),
            depth,
        });
        for child in node.children() {
            walk(child, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    for node in top_level_nodes(tree) {
        walk(node, 0, &mut out);
    }
    out
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_tree;
    use super::*;

    fn ids(path: &[&BookmarkNode]) -> Vec<String> {
        path.iter().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn test_find_by_id() {
        let tree = sample_tree();
        assert_eq!(find_by_id(&tree, Some(&"5".into())).unwrap().title, "Rust");
        assert!(find_by_id(&tree, Some(&"99".into())).is_none());
        assert!(find_by_id(&tree, None).is_none());
    }

    #[test]
    fn test_find_path_is_inclusive() {
        let tree = sample_tree();
        let path = find_path(&tree, &"6".into()).unwrap();
        assert_eq!(ids(&path), ["0", "1", "4", "5", "6"]);
        assert!(find_path(&tree, &"99".into()).is_none());
    }

    #[test]
    fn test_parent_from_path() {
        let tree = sample_tree();
        let deep = find_path(&tree, &"5".into()).unwrap();
        assert_eq!(parent_from_path(&deep), Some("4".into()));
        let top = find_path(&tree, &"1".into()).unwrap();
        assert_eq!(parent_from_path(&top), None);
    }

    #[test]
    fn test_top_level_nodes() {
        let tree = sample_tree();
        let top: Vec<_> = top_level_nodes(&tree).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(top, ["1", "7"]);
        assert!(top_level_nodes(&[]).is_empty());
    }

    #[test]
    fn test_index_parent_and_ancestors() {
        let index = TreeIndex::build(&sample_tree());
        assert_eq!(index.len(), 8);
        assert_eq!(index.parent_of(&"5".into()), Some(&"4".into()));
        assert_eq!(index.parent_of(&"0".into()), None);
        let chain: Vec<_> = index.ancestors(&"6".into()).into_iter().map(|i| i.into_inner()).collect();
        assert_eq!(chain, ["6", "5", "4", "1", "0"]);
        assert!(index.is_self_or_ancestor(&"4".into(), &"5".into()));
        assert!(index.is_self_or_ancestor(&"4".into(), &"4".into()));
        assert!(!index.is_self_or_ancestor(&"7".into(), &"5".into()));
        assert!(index.ancestors(&"99".into()).is_empty());
    }

    #[test]
    fn test_folders_with_depth() {
        let rows: Vec<_> = folders(&sample_tree())
            .into_iter()
            .map(|f| (f.id.into_inner(), f.depth))
            .collect();
        assert_eq!(
            rows,
            [
                ("1".to_string(), 0),
                ("4".to_string(), 1),
                ("5".to_string(), 2),
                ("7".to_string(), 0)
            ]
        );
    }
}
