//! Input normalisation for create and edit.

use url::Url;

use shiori_types::UNTITLED;

use crate::error::{EngineError, EngineResult};

/// Title given to a folder created without one.
pub const DEFAULT_FOLDER_TITLE: &str = "New folder";

/// Trimmed title, or "untitled" when blank.
pub fn normalize_title(title: &str) -> String {
    match title.trim() {
        "" => UNTITLED.to_string(),
        t => t.to_string(),
    }
}

/// Trimmed folder title, or [`DEFAULT_FOLDER_TITLE`] when blank.
pub fn normalize_folder_title(title: &str) -> String {
    match title.trim() {
        "" => DEFAULT_FOLDER_TITLE.to_string(),
        t => t.to_string(),
    }
}

/// Trimmed url; must be non-empty and absolute.
pub fn normalize_url(raw: &str) -> EngineResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidUrl("url is required".into()));
    }
    Url::parse(trimmed).map_err(|e| EngineError::InvalidUrl(format!("{trimmed}: {e}")))?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(normalize_title("  Docs "), "Docs");
        assert_eq!(normalize_title("   "), "untitled");
        assert_eq!(normalize_folder_title(""), "New folder");
    }

    #[test]
    fn test_urls() {
        assert_eq!(normalize_url(" https://docs.rs ").unwrap(), "https://docs.rs");
        assert!(matches!(normalize_url("  "), Err(EngineError::InvalidUrl(_))));
        assert!(matches!(normalize_url("docs.rs"), Err(EngineError::InvalidUrl(_))));
    }
}
