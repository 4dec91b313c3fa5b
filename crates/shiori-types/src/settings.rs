//! Storage keys and small persisted settings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Logical keys of the persisted key-value state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum StorageKey {
    #[strum(serialize = "bookmarks_snapshot")]
    Snapshot,
    #[strum(serialize = "layout_state")]
    Layout,
    #[strum(serialize = "search_settings")]
    SearchSettings,
    #[strum(serialize = "background_settings")]
    BackgroundSettings,
}

impl StorageKey {
    /// Wire name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "bookmarks_snapshot",
            Self::Layout => "layout_state",
            Self::SearchSettings => "search_settings",
            Self::BackgroundSettings => "background_settings",
        }
    }

    /// Keys cleared by "reset settings". The snapshot is never among them.
    pub fn settings_keys() -> [StorageKey; 3] {
        [Self::Layout, Self::SearchSettings, Self::BackgroundSettings]
    }
}

/// Search engine used by the new-tab search box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchEngine {
    Bing,
    #[default]
    Google,
    #[serde(rename = "duckduckgo")]
    #[strum(serialize = "duckduckgo")]
    DuckDuckGo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    pub default_engine: SearchEngine,
}
