// ABOUTME: Generic field extractors over a parsed HTML document.
// ABOUTME: Favicon links, Open Graph title/site name, author meta and <title> splitting.

//! Generic field extraction utilities.
//!
//! Every extractor is pure and returns `None` for missing or blank values:
//! - Selectors are tried in order; first non-empty match wins.
//! - Values are trimmed; whitespace-only counts as absent.

use scraper::{Html, Selector};
use url::Url;

/// Favicon link selectors in priority order.
const FAVICON_SELECTORS: &[&str] = &[
    "link[rel='icon']",
    "link[rel='shortcut icon']",
    "link[rel='apple-touch-icon']",
];

/// Characters that separate a page title from the site name.
/// En dash and hyphen are not separators.
const TITLE_SEPARATORS: &[char] = &['\u{00B7}', '|', '\u{2014}'];

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extracts an attribute value from the first matching selector that yields a non-empty result.
pub fn extract_first_attr(doc: &Html, selectors: &[&str], attr: &str) -> Option<String> {
    for &sel_str in selectors {
        let sel = match Selector::parse(sel_str) {
            Ok(s) => s,
            Err(_) => continue,
        };

        for el in doc.select(&sel) {
            if let Some(value) = el.value().attr(attr).and_then(non_empty) {
                return Some(value);
            }
        }
    }
    None
}

/// Extracts the `content` attribute from the first matching meta tag.
pub fn extract_meta_content(doc: &Html, selector: &str) -> Option<String> {
    extract_first_attr(doc, &[selector], "content")
}

/// Absolute URL of the page's declared favicon.
///
/// Tries `icon`, then `shortcut icon`, then `apple-touch-icon`, and resolves
/// the href against `page_url`. An unparseable page URL leaves absolute hrefs
/// usable and drops relative ones.
pub fn favicon(doc: &Html, page_url: &str) -> Option<String> {
    let href = extract_first_attr(doc, FAVICON_SELECTORS, "href")?;
    match Url::parse(page_url) {
        Ok(base) => base.join(&href).ok().map(|u| u.to_string()),
        Err(_) => Url::parse(&href).ok().map(|u| u.to_string()),
    }
}

/// Trimmed `og:title`.
pub fn og_title(doc: &Html) -> Option<String> {
    extract_meta_content(doc, "meta[property='og:title']")
}

/// Trimmed `og:site_name`.
pub fn og_site_name(doc: &Html) -> Option<String> {
    extract_meta_content(doc, "meta[property='og:site_name']")
}

/// Trimmed `<meta name="author">`.
pub fn author(doc: &Html) -> Option<String> {
    extract_meta_content(doc, "meta[name='author']")
}

/// Full trimmed text of the first `<title>` element.
pub fn raw_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").ok()?;
    let el = doc.select(&sel).next()?;
    non_empty(&el.text().collect::<String>())
}

/// `<title>` text up to the first separator (`·`, `|` or `—`).
pub fn document_title(doc: &Html) -> Option<String> {
    let title = raw_title(doc)?;
    let first = title.split(TITLE_SEPARATORS).next().unwrap_or(title.as_str());
    non_empty(first)
}
