//! Background service: the only code that talks to the bookmark store.
//!
//! Every successful mutation is followed by a snapshot refresh and a
//! [`BookmarkFlow::BookmarksChanged`] broadcast. Failures come back as
//! [`ApplyResult`]s; nothing here panics or leaks an `Err` to the UI.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use shiori_types::{
    ApplyResult, BookmarkAction, BookmarkId, BookmarkNode, CreateDetails, LoadResponse,
};

use crate::error::{EngineError, EngineResult};
use crate::flows::{BookmarkBus, BookmarkFlow, ChangeReason};
use crate::reorder::{self, Reorderer};
use crate::snapshot::SnapshotStore;
use crate::store::BookmarkStore;

/// Routes mutations to the store and keeps the snapshot current.
pub struct BookmarkService {
    store: Arc<dyn BookmarkStore>,
    snapshots: SnapshotStore,
    bus: BookmarkBus,
}

impl BookmarkService {
    pub fn new(store: Arc<dyn BookmarkStore>, snapshots: SnapshotStore, bus: BookmarkBus) -> Self {
        Self { store, snapshots, bus }
    }

    pub fn store(&self) -> &dyn BookmarkStore {
        self.store.as_ref()
    }

    pub fn bus(&self) -> &BookmarkBus {
        &self.bus
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load the live tree, or fall back to the last snapshot.
    pub async fn load_bookmarks(&self) -> LoadResponse {
        let live_error = match self.store.get_tree().await {
            Ok(tree) => match self.snapshots.write(tree.clone()).await {
                Ok(snapshot) => {
                    self.bus.publish(BookmarkFlow::SnapshotWritten {
                        updated_at: snapshot.updated_at,
                    });
                    return LoadResponse {
                        tree,
                        updated_at: snapshot.updated_at,
                        from_cache: false,
                        error: None,
                    };
                }
                Err(e) => {
                    // The live tree is still good; only the cache is stale.
                    warn!(error = %e, "snapshot write failed");
                    return LoadResponse {
                        tree,
                        updated_at: Utc::now(),
                        from_cache: false,
                        error: None,
                    };
                }
            },
            Err(e) => e.to_string(),
        };

        warn!(error = %live_error, "bookmark store unavailable, serving snapshot");
        match self.snapshots.read().await {
            Ok(Some(snapshot)) => LoadResponse {
                tree: snapshot.tree,
                updated_at: snapshot.updated_at,
                from_cache: true,
                error: Some(live_error),
            },
            Ok(None) => LoadResponse {
                tree: Vec::new(),
                updated_at: Utc::now(),
                from_cache: true,
                error: Some(live_error),
            },
            Err(e) => {
                error!(error = %e, "snapshot unreadable");
                LoadResponse {
                    tree: Vec::new(),
                    updated_at: Utc::now(),
                    from_cache: true,
                    error: Some(live_error),
                }
            }
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply one action, refresh the snapshot and broadcast.
    pub async fn apply(&self, action: BookmarkAction) -> ApplyResult {
        let verb = action.verb();
        match self.execute(action).await {
            Ok(_) => ApplyResult::ok(),
            Err(e) => {
                error!(action = verb, error = %e, "bookmark change failed");
                e.into()
            }
        }
    }

    /// [`Self::apply`] with the typed error, returning the created node for
    /// `Create`.
    pub async fn execute(&self, action: BookmarkAction) -> EngineResult<Option<BookmarkNode>> {
        let (reason, created) = match action {
            BookmarkAction::Create(details) => {
                let node = self.store.create(details).await?;
                (ChangeReason::Create, Some(node))
            }
            BookmarkAction::Move { id, destination } => {
                self.store.move_node(&id, destination).await?;
                (ChangeReason::Move, None)
            }
            BookmarkAction::Remove { id, recursive } => {
                self.remove(&id, recursive).await?;
                (ChangeReason::Remove, None)
            }
            BookmarkAction::Update { id, changes } => {
                self.store.update(&id, changes).await?;
                (ChangeReason::Update, None)
            }
        };
        self.changed(BookmarkFlow::changed(reason)).await;
        Ok(created)
    }

    async fn remove(&self, id: &BookmarkId, recursive: bool) -> EngineResult<()> {
        if recursive {
            self.store.remove_tree(id).await?;
            return Ok(());
        }
        let node = self
            .store
            .get_sub_tree(id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        if node.is_folder() {
            return Err(EngineError::FolderDeleteForbidden(id.clone()));
        }
        self.store.remove(id).await?;
        Ok(())
    }

    /// Create a node without broadcasting; for multi-step batches that
    /// announce once at the end.
    pub(crate) async fn create_quiet(&self, details: CreateDetails) -> EngineResult<BookmarkNode> {
        Ok(self.store.create(details).await?)
    }

    /// Drive `parent_id`'s children to `ordered_ids`, then refresh and broadcast.
    pub async fn reorder_children(&self, parent_id: Option<&BookmarkId>, ordered_ids: &[BookmarkId]) -> ApplyResult {
        let Some(parent_id) = parent_id else {
            return EngineError::UnknownParent.into();
        };
        match self.reorder_inner(parent_id, ordered_ids).await {
            Ok(()) => ApplyResult::ok(),
            Err(e) => {
                error!(parent = %parent_id, error = %e, "reorder failed");
                e.into()
            }
        }
    }

    async fn reorder_inner(&self, parent_id: &BookmarkId, ordered_ids: &[BookmarkId]) -> EngineResult<()> {
        let moved = reorder::reorder_children(self.store.as_ref(), parent_id, ordered_ids).await;
        match moved {
            Ok(0) => Ok(()),
            Ok(_) => {
                self.changed(BookmarkFlow::changed_in(ChangeReason::Reorder, parent_id.clone()))
                    .await;
                Ok(())
            }
            Err(e) => {
                // Earlier moves may have landed; let views re-read.
                if matches!(e, EngineError::BatchStep { step, .. } if step > 0) {
                    self.changed(BookmarkFlow::changed_in(ChangeReason::Reorder, parent_id.clone()))
                        .await;
                }
                Err(e)
            }
        }
    }

    /// The store was edited behind our back.
    pub async fn on_external_change(&self) {
        info!("external bookmark change");
        self.changed(BookmarkFlow::changed(ChangeReason::External)).await;
    }

    /// Refresh the snapshot, then broadcast `event`.
    ///
    /// The mutation has already happened, so a failed refresh is logged and
    /// the broadcast still goes out.
    pub(crate) async fn changed(&self, event: BookmarkFlow) {
        match self.store.get_tree().await {
            Ok(tree) => match self.snapshots.write(tree).await {
                Ok(snapshot) => {
                    self.bus.publish(BookmarkFlow::SnapshotWritten {
                        updated_at: snapshot.updated_at,
                    });
                }
                Err(e) => warn!(error = %e, "snapshot refresh failed"),
            },
            Err(e) => warn!(error = %e, "could not re-read tree after change"),
        }
        let receivers = self.bus.publish(event);
        debug!(receivers, "bookmarks changed");
    }
}

#[async_trait]
impl Reorderer for BookmarkService {
    async fn reorder(&self, parent_id: &BookmarkId, ordered_ids: &[BookmarkId]) -> EngineResult<()> {
        self.reorder_inner(parent_id, ordered_ids).await
    }
}
