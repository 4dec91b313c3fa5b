//! In-memory bookmark store.
//!
//! Behaves like the browser's bookmark service closely enough to test the
//! engine against: store-assigned ids, a synthetic root, clamped move
//! indices. Also used as the working copy behind [`super::JsonFileStore`].
//!
//! Faults can be injected to exercise offline fallback and partial batch
//! failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use shiori_types::{BookmarkChanges, BookmarkId, BookmarkNode, CreateDetails, MoveDestination};

use super::error::{StoreError, StoreResult};
use super::ops::BookmarkStore;

/// Tree plus id allocator, guarded together.
#[derive(Debug)]
struct Inner {
    root: BookmarkNode,
    next_id: u64,
}

/// In-memory bookmark store.
///
/// Thread-safe via internal `RwLock`. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    offline: AtomicBool,
    failing_moves: Mutex<HashSet<BookmarkId>>,
    create_budget: Mutex<Option<usize>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store holding the two default containers, like a fresh profile.
    pub fn new() -> Self {
        Self::with_tree(vec![
            BookmarkNode::folder("1", "Bookmarks bar", vec![]),
            BookmarkNode::folder("2", "Other bookmarks", vec![]),
        ])
    }

    /// A store whose synthetic root holds `top_level`.
    ///
    /// Numeric ids already present reserve their value; new ids continue
    /// after the largest one.
    pub fn with_tree(top_level: Vec<BookmarkNode>) -> Self {
        let root = BookmarkNode::folder(BookmarkId::root(), "", top_level).with_parent_ids();
        let next_id = max_numeric_id(&root) + 1;
        Self {
            inner: RwLock::new(Inner { root, next_id }),
            offline: AtomicBool::new(false),
            failing_moves: Mutex::new(HashSet::new()),
            create_budget: Mutex::new(None),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Rebuild from a full `get_tree()` result (e.g. loaded from disk).
    pub fn from_tree(tree: Vec<BookmarkNode>) -> Self {
        match tree.into_iter().next() {
            Some(root) if root.id.is_root() => {
                Self::with_tree(root.children.unwrap_or_default())
            }
            Some(other) => Self::with_tree(vec![other]),
            None => Self::new(),
        }
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make every move of `id` fail.
    pub fn fail_moves_of(&self, id: impl Into<BookmarkId>) {
        self.failing_moves.lock().insert(id.into());
    }

    /// Let `n` more creates succeed, then fail every create.
    pub fn fail_creates_after(&self, n: usize) {
        *self.create_budget.lock() = Some(n);
    }

    /// Number of read calls served (including failed ones).
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls attempted (including failed ones).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Ids of the direct children of `parent_id`, synchronously.
    pub fn child_ids(&self, parent_id: &str) -> Vec<BookmarkId> {
        let inner = self.inner.read();
        find(&inner.root, parent_id)
            .map(|n| n.children().iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    /// A clone of the full tree, synchronously.
    pub fn tree(&self) -> Vec<BookmarkNode> {
        vec![self.inner.read().root.clone()]
    }

    /// Put back a tree taken with [`Self::tree`]. Ids handed out since
    /// stay reserved.
    pub(crate) fn restore(&self, tree: Vec<BookmarkNode>) {
        if let Some(root) = tree.into_iter().next() {
            self.inner.write().root = root;
        }
    }

    fn check_read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }

    fn check_write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("bookmark service is not reachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn get_tree(&self) -> StoreResult<Vec<BookmarkNode>> {
        self.check_read()?;
        Ok(self.tree())
    }

    async fn get_children(&self, parent_id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>> {
        self.check_read()?;
        let inner = self.inner.read();
        let parent = find(&inner.root, parent_id.as_str())
            .ok_or_else(|| StoreError::not_found(parent_id.as_str()))?;
        Ok(parent.children().iter().map(shallow).collect())
    }

    async fn get_sub_tree(&self, id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>> {
        self.check_read()?;
        let inner = self.inner.read();
        let node = find(&inner.root, id.as_str()).ok_or_else(|| StoreError::not_found(id.as_str()))?;
        Ok(vec![node.clone()])
    }

    async fn create(&self, details: CreateDetails) -> StoreResult<BookmarkNode> {
        self.check_write()?;
        if details.parent_id.is_root() {
            return Err(StoreError::rejected("cannot add nodes to the root"));
        }
        if let Some(left) = self.create_budget.lock().as_mut() {
            if *left == 0 {
                return Err(StoreError::other("create failed"));
            }
            *left -= 1;
        }
        let mut inner = self.inner.write();
        let id = BookmarkId::new(inner.next_id.to_string());

        let parent = find_mut(&mut inner.root, details.parent_id.as_str())
            .ok_or_else(|| StoreError::invalid_parent(details.parent_id.as_str()))?;
        if !parent.is_folder() {
            return Err(StoreError::invalid_parent(details.parent_id.as_str()));
        }

        let node = BookmarkNode {
            id: id.clone(),
            title: details.title,
            children: if details.url.is_none() { Some(Vec::new()) } else { None },
            url: details.url,
            parent_id: Some(details.parent_id.clone()),
        };
        let children = parent.children.get_or_insert_with(Vec::new);
        let index = details.index.unwrap_or(children.len()).min(children.len());
        children.insert(index, node.clone());
        inner.next_id += 1;
        Ok(node)
    }

    async fn move_node(&self, id: &BookmarkId, destination: MoveDestination) -> StoreResult<()> {
        self.check_write()?;
        if self.failing_moves.lock().contains(id) {
            return Err(StoreError::other(format!("move of {id} failed")));
        }
        if id.is_root() || destination.parent_id.is_root() {
            return Err(StoreError::rejected("cannot move into or out of the root"));
        }

        let mut inner = self.inner.write();
        let node = find(&inner.root, id.as_str()).ok_or_else(|| StoreError::not_found(id.as_str()))?;
        if find(node, destination.parent_id.as_str()).is_some() {
            return Err(StoreError::invalid_parent(format!(
                "{} is inside {id}",
                destination.parent_id
            )));
        }
        match find(&inner.root, destination.parent_id.as_str()) {
            Some(parent) if parent.is_folder() => {}
            _ => return Err(StoreError::invalid_parent(destination.parent_id.as_str())),
        }

        let Some(mut node) = detach(&mut inner.root, id.as_str()) else {
            return Err(StoreError::not_found(id.as_str()));
        };
        node.parent_id = Some(destination.parent_id.clone());
        let Some(parent) = find_mut(&mut inner.root, destination.parent_id.as_str()) else {
            return Err(StoreError::invalid_parent(destination.parent_id.as_str()));
        };
        let children = parent.children.get_or_insert_with(Vec::new);
        let index = destination.index.unwrap_or(children.len()).min(children.len());
        children.insert(index, node);
        Ok(())
    }

    async fn remove(&self, id: &BookmarkId) -> StoreResult<()> {
        self.check_write()?;
        let mut inner = self.inner.write();
        let node = find(&inner.root, id.as_str()).ok_or_else(|| StoreError::not_found(id.as_str()))?;
        if node.is_folder() && !node.children().is_empty() {
            return Err(StoreError::rejected(format!("folder {id} is not empty")));
        }
        remove_checked(&mut inner.root, id)
    }

    async fn remove_tree(&self, id: &BookmarkId) -> StoreResult<()> {
        self.check_write()?;
        let mut inner = self.inner.write();
        remove_checked(&mut inner.root, id)
    }

    async fn update(&self, id: &BookmarkId, changes: BookmarkChanges) -> StoreResult<()> {
        self.check_write()?;
        if id.is_root() {
            return Err(StoreError::rejected("cannot modify the root"));
        }
        let mut inner = self.inner.write();
        let node = find_mut(&mut inner.root, id.as_str()).ok_or_else(|| StoreError::not_found(id.as_str()))?;
        if changes.url.is_some() && node.is_folder() {
            return Err(StoreError::rejected(format!("{id} is a folder and has no url")));
        }
        if let Some(title) = changes.title {
            node.title = title;
        }
        if let Some(url) = changes.url {
            node.url = Some(url);
        }
        Ok(())
    }
}

// ── tree helpers ────────────────────────────────────────────────────────────

fn find<'a>(node: &'a BookmarkNode, id: &str) -> Option<&'a BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    node.children().iter().find_map(|c| find(c, id))
}

fn find_mut<'a>(node: &'a mut BookmarkNode, id: &str) -> Option<&'a mut BookmarkNode> {
    if node.id == id {
        return Some(node);
    }
    node.children
        .as_mut()?
        .iter_mut()
        .find_map(|c| find_mut(c, id))
}

fn detach(node: &mut BookmarkNode, id: &str) -> Option<BookmarkNode> {
    let children = node.children.as_mut()?;
    if let Some(pos) = children.iter().position(|c| c.id == id) {
        return Some(children.remove(pos));
    }
    children.iter_mut().find_map(|c| detach(c, id))
}

fn remove_checked(root: &mut BookmarkNode, id: &BookmarkId) -> StoreResult<()> {
    if id.is_root() {
        return Err(StoreError::rejected("cannot remove the root"));
    }
    detach(root, id.as_str())
        .map(|_| ())
        .ok_or_else(|| StoreError::not_found(id.as_str()))
}

/// Node without its descendants, as `getChildren` reports it.
fn shallow(node: &BookmarkNode) -> BookmarkNode {
    BookmarkNode {
        children: None,
        ..node.clone()
    }
}

fn max_numeric_id(node: &BookmarkNode) -> u64 {
    let own = node.id.as_str().parse::<u64>().unwrap_or(0);
    node.children()
        .iter()
        .map(max_numeric_id)
        .fold(own, u64::max)
}
