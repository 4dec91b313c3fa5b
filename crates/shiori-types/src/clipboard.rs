//! Clipboard item: the single pending cut or copy.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::ids::BookmarkId;

/// Whether the clipboard holds a bookmark or a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Bookmark,
    Folder,
}

/// Cut is consumed by one paste; copy can be pasted repeatedly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClipboardOp {
    Cut,
    Copy,
}

/// A captured cut/copy. Not persisted across sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardItem {
    pub id: BookmarkId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub operation: ClipboardOp,
    /// Parent at capture time. Informational only: paste re-reads the live tree.
    pub parent_id: BookmarkId,
}
