//! Reorder reconciliation.
//!
//! Two halves:
//!
//! - [`reorder_children`]: the batch primitive. Given a folder and a desired
//!   order, it re-reads the folder's children and issues one move per
//!   position, ascending. It always works from the store's current order, so
//!   re-running it after a partial failure is safe.
//! - [`SortableOrder`]: the optimistic side. A drop is shown immediately,
//!   written back through a [`Reorderer`], and rolled back on failure, with
//!   an epoch counter ensuring only the newest request's outcome is applied.
//!
//! ```text
//!             seed / navigate (epoch += 1)
//!                      │
//!   drop ──▶ show next ──▶ offline or no parent? ──yes──▶ restore prev (Rejected)
//!                      │no
//!                      ▼
//!          request_id = ++epoch ──▶ reorderer.reorder(..).await
//!                      │
//!        epoch != request_id ──▶ Superseded (result ignored)
//!        Err ──▶ restore prev (RolledBack)
//!        Ok  ──▶ Applied
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use shiori_types::{ApplyResult, BookmarkId, MoveDestination};

use crate::error::{EngineError, EngineResult};
use crate::store::BookmarkStore;

/// Remove the element at `from` and reinsert it at `to`.
///
/// Out-of-range indices leave the order unchanged.
pub fn array_move<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut next = items.to_vec();
    if from >= next.len() || to >= next.len() {
        return next;
    }
    let item = next.remove(from);
    next.insert(to, item);
    next
}

/// Order after dropping `dragged` onto the slot held by `over`.
pub fn drag_to(ids: &[BookmarkId], dragged: &BookmarkId, over: &BookmarkId) -> Vec<BookmarkId> {
    let from = ids.iter().position(|id| id == dragged);
    let to = ids.iter().position(|id| id == over);
    match (from, to) {
        (Some(from), Some(to)) => array_move(ids, from, to),
        _ => ids.to_vec(),
    }
}

/// Reconcile a requested order with the folder's current children.
///
/// Requested ids that are gone are dropped, duplicates keep their first
/// position, and current children the request does not mention are
/// appended in their current order.
pub fn plan_order(current: &[BookmarkId], requested: &[BookmarkId]) -> Vec<BookmarkId> {
    let present: HashSet<&BookmarkId> = current.iter().collect();
    let mut seen = HashSet::new();
    let mut plan: Vec<BookmarkId> = requested
        .iter()
        .filter(|id| present.contains(id) && seen.insert(*id))
        .cloned()
        .collect();
    plan.extend(current.iter().filter(|id| !seen.contains(id)).cloned());
    plan
}

/// Drive the children of `parent_id` to `ordered_ids`.
///
/// Returns the number of moves issued. A failing move aborts the batch with
/// [`EngineError::BatchStep`]; moves already applied stay applied.
pub async fn reorder_children(
    store: &dyn BookmarkStore,
    parent_id: &BookmarkId,
    ordered_ids: &[BookmarkId],
) -> EngineResult<usize> {
    let current: Vec<BookmarkId> = store
        .get_children(parent_id)
        .await?
        .into_iter()
        .map(|n| n.id)
        .collect();
    if current.len() <= 1 {
        debug!(parent = %parent_id, "nothing to reorder");
        return Ok(0);
    }

    let plan = plan_order(&current, ordered_ids);
    for (index, id) in plan.iter().enumerate() {
        store
            .move_node(id, MoveDestination::new(parent_id, Some(index)))
            .await
            .map_err(|e| EngineError::batch_step(index, id, e))?;
    }
    info!(parent = %parent_id, count = plan.len(), "reordered children");
    Ok(plan.len())
}

/// Something that can write a folder's order back to the store.
///
/// The background service implements this; tests substitute slow or
/// failing fakes.
#[async_trait]
pub trait Reorderer: Send + Sync {
    async fn reorder(&self, parent_id: &BookmarkId, ordered_ids: &[BookmarkId]) -> EngineResult<()>;
}

/// What became of a drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Written back; the optimistic order is now the store's order.
    Applied,
    /// Refused before any remote call; previous order restored.
    Rejected(String),
    /// The write failed; previous order restored.
    RolledBack(String),
    /// A newer drop or a navigation overtook this one; nothing changed.
    Superseded,
}

impl ReorderOutcome {
    /// Message to surface to the user, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Rejected(e) | Self::RolledBack(e) => Some(e),
            Self::Applied | Self::Superseded => None,
        }
    }
}

impl From<ReorderOutcome> for ApplyResult {
    fn from(outcome: ReorderOutcome) -> Self {
        match outcome.error() {
            Some(e) => ApplyResult::failed(e),
            None => ApplyResult::ok(),
        }
    }
}

/// Optimistic display order for one folder view.
#[derive(Debug, Default)]
pub struct SortableOrder {
    ordered_ids: Mutex<Vec<BookmarkId>>,
    epoch: AtomicU64,
}

impl SortableOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the store's order, invalidating any in-flight request.
    pub fn seed(&self, ids: Vec<BookmarkId>) {
        *self.ordered_ids.lock() = ids;
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub fn ordered_ids(&self) -> Vec<BookmarkId> {
        self.ordered_ids.lock().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Show `next_ids` now and write them back to `parent_id`.
    pub async fn handle_reorder(
        &self,
        next_ids: Vec<BookmarkId>,
        parent_id: Option<&BookmarkId>,
        offline: bool,
        reorderer: &dyn Reorderer,
    ) -> ReorderOutcome {
        let previous = std::mem::replace(&mut *self.ordered_ids.lock(), next_ids.clone());

        let parent_id = match (offline, parent_id) {
            (true, _) => return self.refuse(previous, EngineError::Offline),
            (false, None) => return self.refuse(previous, EngineError::UnknownParent),
            (false, Some(parent_id)) => parent_id,
        };

        let request_id = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let result = reorderer.reorder(parent_id, &next_ids).await;

        if self.epoch.load(Ordering::SeqCst) != request_id {
            debug!(request_id, "discarding superseded reorder result");
            return ReorderOutcome::Superseded;
        }
        match result {
            Ok(()) => ReorderOutcome::Applied,
            Err(e) => {
                *self.ordered_ids.lock() = previous;
                warn!(parent = %parent_id, error = %e, "reorder failed, rolled back");
                ReorderOutcome::RolledBack(e.to_string())
            }
        }
    }

    fn refuse(&self, previous: Vec<BookmarkId>, error: EngineError) -> ReorderOutcome {
        *self.ordered_ids.lock() = previous;
        warn!(error = %error, "reorder refused");
        ReorderOutcome::Rejected(error.to_string())
    }
}
