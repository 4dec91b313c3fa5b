//! Layout persistence.
//!
//! Callers never await a layout write: every mutation hands the whole new
//! [`LayoutState`] to a writer task and moves on. The writer applies writes
//! strictly in submission order, so the last submitted layout is the one
//! left on disk. [`LayoutWriter::flush`] waits for everything submitted so
//! far, which is what tests and shutdown need.
//!
//! ```text
//!  session ──Save(layout)──▶ ┌─────────────┐ ──set(LAYOUT)──▶ StateStore
//!  session ──Save(layout)──▶ │ writer task │
//!  session ──Flush(ack)────▶ └─────────────┘ ──ack──▶ session
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use shiori_types::{LayoutState, StorageKey};

use crate::flows::{BookmarkBus, BookmarkFlow};
use crate::state::{StateResult, StateStore, load_typed};

enum WriteCmd {
    Save(Box<LayoutState>),
    Flush(oneshot::Sender<()>),
}

/// Read `LAYOUT`, falling back to defaults when absent or unreadable.
pub async fn read_layout(state: &dyn StateStore) -> LayoutState {
    match load_typed::<LayoutState>(state, StorageKey::Layout).await {
        Ok(Some(layout)) => layout,
        Ok(None) => LayoutState::default(),
        Err(e) => {
            warn!(error = %e, "layout state unreadable, using defaults");
            LayoutState::default()
        }
    }
}

/// Handle to the ordered, fire-and-forget layout writer.
///
/// Cloning shares the same writer task. The task exits once every handle
/// is dropped.
#[derive(Clone)]
pub struct LayoutWriter {
    tx: mpsc::UnboundedSender<WriteCmd>,
}

impl LayoutWriter {
    /// Spawn the writer task on the current runtime.
    pub fn spawn(state: Arc<dyn StateStore>, bus: BookmarkBus) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(state, bus, rx));
        Self { tx }
    }

    /// Queue `layout` for writing.
    pub fn save(&self, layout: &LayoutState) {
        if self.tx.send(WriteCmd::Save(Box::new(layout.clone()))).is_err() {
            warn!("layout writer is gone; dropping layout write");
        }
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteCmd::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer(state: Arc<dyn StateStore>, bus: BookmarkBus, mut rx: mpsc::UnboundedReceiver<WriteCmd>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WriteCmd::Save(layout) => match write_layout(state.as_ref(), &layout).await {
                Ok(()) => {
                    debug!("layout written");
                    bus.publish(BookmarkFlow::LayoutChanged);
                }
                Err(e) => warn!(error = %e, "layout write failed"),
            },
            WriteCmd::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("layout writer stopped");
}

async fn write_layout(state: &dyn StateStore, layout: &LayoutState) -> StateResult<()> {
    state.set(StorageKey::Layout, serde_json::to_value(layout)?).await
}
