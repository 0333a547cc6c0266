// ABOUTME: HTML metadata extraction for link pills.
// ABOUTME: Runs the ordered title chain, author lookup and favicon discovery over one document.

//! Metadata extraction module.
//!
//! Submodules:
//! - `fields`: generic extractors (favicon links, Open Graph, author, `<title>`).
//! - `site`: hostname-keyed refinements and aggregator path labels.

pub mod fields;
pub mod site;

use scraper::Html;

use crate::slug::title_from_url;
use crate::url_norm::hostname;

/// Inputs shared by every title source.
pub struct Page<'a> {
    pub doc: &'a Html,
    /// The requested (normalized) URL; drives host matching and slug titles.
    pub url: &'a str,
    /// URL relative links resolve against, usually the post-redirect URL.
    pub base_url: &'a str,
    pub host: String,
    pub site_rules: bool,
}

impl<'a> Page<'a> {
    pub fn new(doc: &'a Html, url: &'a str) -> Self {
        Self {
            doc,
            url,
            base_url: url,
            host: hostname(url).unwrap_or_default(),
            site_rules: true,
        }
    }

    pub fn with_base_url(mut self, base_url: &'a str) -> Self {
        self.base_url = base_url;
        self
    }
}

/// A title source; `None` passes to the next one.
pub type TitleSource = fn(&Page<'_>) -> Option<String>;

fn site_specific(page: &Page<'_>) -> Option<String> {
    if page.site_rules {
        site::site_title(page.doc, &page.host)
    } else {
        None
    }
}

fn document_title(page: &Page<'_>) -> Option<String> {
    fields::document_title(page.doc)
}

fn og_title(page: &Page<'_>) -> Option<String> {
    fields::og_title(page.doc)
}

/// Title sources in priority order. The URL slug is the final fallback.
pub const TITLE_CHAIN: &[TitleSource] = &[site_specific, document_title, og_title];

/// Fields extracted from one HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFields {
    pub title: String,
    pub author: String,
    pub favicon: Option<String>,
}

/// First title produced by `chain`, else the URL slug title.
pub fn resolve_title(page: &Page<'_>, chain: &[TitleSource]) -> String {
    chain
        .iter()
        .find_map(|source| source(page))
        .unwrap_or_else(|| title_from_url(page.url))
}

/// Extract title, author and favicon from a parsed page.
///
/// Aggregator URLs with a community path short-circuit the title chain. The
/// author comes from `<meta name="author">` only; `og:site_name` is never used.
pub fn extract_page(page: &Page<'_>) -> PageFields {
    let favicon = fields::favicon(page.doc, page.base_url);

    if page.site_rules {
        if let Some(label) = site::aggregator_label(page.url) {
            return PageFields {
                title: label.title,
                author: label.author,
                favicon,
            };
        }
    }

    PageFields {
        title: resolve_title(page, TITLE_CHAIN),
        author: fields::author(page.doc).unwrap_or_default(),
        favicon,
    }
}
