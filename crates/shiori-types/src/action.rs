//! Remote mutations and the results handed back to the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::BookmarkId;
use crate::node::BookmarkNode;

/// Arguments to the store's `create`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDetails {
    pub parent_id: BookmarkId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl CreateDetails {
    pub fn folder(parent_id: impl Into<BookmarkId>, title: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            url: None,
            index: None,
        }
    }

    pub fn bookmark(parent_id: impl Into<BookmarkId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            url: Some(url.into()),
            index: None,
        }
    }

    pub fn at(mut self, index: Option<usize>) -> Self {
        self.index = index;
        self
    }
}

/// Arguments to the store's `move`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveDestination {
    pub parent_id: BookmarkId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl MoveDestination {
    pub fn new(parent_id: impl Into<BookmarkId>, index: Option<usize>) -> Self {
        Self {
            parent_id: parent_id.into(),
            index,
        }
    }
}

/// Arguments to the store's `update`. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One remote mutation, as routed through the background service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BookmarkAction {
    Create(CreateDetails),
    #[serde(rename_all = "camelCase")]
    Move {
        id: BookmarkId,
        #[serde(flatten)]
        destination: MoveDestination,
    },
    Remove {
        id: BookmarkId,
        #[serde(default)]
        recursive: bool,
    },
    Update {
        id: BookmarkId,
        #[serde(flatten)]
        changes: BookmarkChanges,
    },
}

impl BookmarkAction {
    /// Short verb for logs.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
        }
    }
}

/// `{success, error?}`: the only failure shape the UI ever sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApplyResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.success
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for ApplyResult {
    fn from(r: Result<(), E>) -> Self {
        match r {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Result of loading the tree: live, or from the cached snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub tree: Vec<BookmarkNode>,
    pub updated_at: DateTime<Utc>,
    pub from_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_shape() {
        let action = BookmarkAction::Move {
            id: "7".into(),
            destination: MoveDestination::new("1", Some(2)),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["id"], "7");
        assert_eq!(json["parentId"], "1");
        assert_eq!(json["index"], 2);

        let back: BookmarkAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_apply_result_from_result() {
        let ok: ApplyResult = Ok::<(), String>(()).into();
        assert!(ok.success);
        let err: ApplyResult = Err::<(), _>("boom").into();
        assert_eq!(err, ApplyResult::failed("boom"));
    }
}
