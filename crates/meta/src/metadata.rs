// ABOUTME: LinkMetadata value type holding the resolved title, favicon and author for one link.
// ABOUTME: Includes the uncached fallback constructor and small display helpers.

use serde::{Deserialize, Serialize};

use crate::slug::title_from_url;

/// The resolved display data for one URL.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LinkMetadata {
    /// Never empty for a non-empty URL; worst case the hostname.
    pub title: String,
    /// Icon URL or `data:` URI, empty when none could be resolved.
    pub favicon: String,
    /// Byline or site label, empty when none was found.
    pub author: String,
}

impl LinkMetadata {
    pub fn new(
        title: impl Into<String>,
        favicon: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            favicon: favicon.into(),
            author: author.into(),
        }
    }

    /// Degraded metadata for a URL whose resolution failed: slug or hostname
    /// title, no favicon, no author.
    pub fn fallback(url: &str) -> Self {
        Self::new(title_from_url(url), "", "")
    }

    /// Returns true if a favicon was resolved.
    pub fn has_favicon(&self) -> bool {
        !self.favicon.is_empty()
    }

    /// Returns true if the result has an author.
    pub fn has_author(&self) -> bool {
        !self.author.is_empty()
    }

    /// Plain-text label for the pill: `title` or `title · author`.
    pub fn label(&self) -> String {
        if self.has_author() {
            format!("{} \u{00B7} {}", self.title, self.author)
        } else {
            self.title.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fallback_uses_slug_or_host() {
        assert_eq!(
            LinkMetadata::fallback("https://www.example.com/guides/async-rust-in-depth"),
            LinkMetadata::new("Async Rust In Depth", "", "")
        );
        assert_eq!(
            LinkMetadata::fallback("https://www.example.com/"),
            LinkMetadata::new("www.example.com", "", "")
        );
    }

    #[test]
    fn test_has_helpers() {
        let mut meta = LinkMetadata::new("Title", "", "");
        assert!(!meta.has_favicon());
        assert!(!meta.has_author());

        meta.favicon = "https://www.example.com/favicon.ico".to_string();
        meta.author = "Jane".to_string();
        assert!(meta.has_favicon());
        assert!(meta.has_author());
    }

    #[test]
    fn test_label() {
        assert_eq!(LinkMetadata::new("Title", "", "").label(), "Title");
        assert_eq!(
            LinkMetadata::new("Post", "", "r/rust").label(),
            "Post \u{00B7} r/rust"
        );
    }

    #[test]
    fn test_serializes_flat() {
        let json = serde_json::to_value(LinkMetadata::new("T", "F", "A")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "title": "T", "favicon": "F", "author": "A" })
        );
    }
}
