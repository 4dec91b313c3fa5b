//! Cached, timestamped copy of the bookmark tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::BookmarkNode;

/// Current on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The last-known tree, served when the live store is unreachable.
///
/// `updated_at` is monotonically non-decreasing across writes from one
/// engine instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkSnapshot {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub tree: Vec<BookmarkNode>,
}

impl BookmarkSnapshot {
    pub fn new(tree: Vec<BookmarkNode>, updated_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            updated_at,
            tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updated_at_is_iso8601_on_the_wire() {
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let snap = BookmarkSnapshot::new(vec![], at);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["updatedAt"], "2026-01-02T03:04:05Z");
        assert_eq!(json["version"], 1);
    }
}
