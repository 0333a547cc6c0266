// ABOUTME: Site-specific refinements keyed by hostname.
// ABOUTME: Code-hosting title cleanup and link-aggregator labels derived from the URL path.

use scraper::Html;
use url::Url;

use crate::extractors::fields::{og_title, raw_title};
use crate::slug::humanize;

/// A title refinement for one site, matched on the host and its subdomains.
#[derive(Debug, Clone, Copy)]
pub struct SiteRule {
    pub host: &'static str,
    pub title: fn(&Html) -> Option<String>,
}

/// Built-in site rules, consulted in order.
pub const SITE_RULES: &[SiteRule] = &[SiteRule {
    host: "github.com",
    title: github_title,
}];

/// Hosts whose URL paths encode a community and post slug.
const AGGREGATOR_HOSTS: &[&str] = &["reddit.com"];

/// Returns true when `host` is `domain` or one of its subdomains.
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.');
    host.eq_ignore_ascii_case(domain)
        || (host.len() > domain.len()
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
            && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain))
}

/// Title from the first site rule matching `host`.
pub fn site_title(doc: &Html, host: &str) -> Option<String> {
    SITE_RULES
        .iter()
        .find(|rule| host_matches(host, rule.host))
        .and_then(|rule| (rule.title)(doc))
}

fn strip_description(title: &str) -> Option<String> {
    let head = title.split(':').next().unwrap_or(title).trim();
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}

/// Code-hosting titles carry a `: description` tail; drop it.
///
/// Prefers `og:title`, falling back to the raw `<title>` text.
pub fn github_title(doc: &Html) -> Option<String> {
    og_title(doc)
        .or_else(|| raw_title(doc))
        .and_then(|t| strip_description(&t))
}

/// Title and author read straight from an aggregator URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLabel {
    pub title: String,
    pub author: String,
}

/// Label for aggregator URLs shaped like `/r/<community>/...`.
///
/// Posts (`/r/<community>/comments/<id>/<slug>`) get the humanized slug as the
/// title and `r/<community>` as the author. Other community pages get
/// `r/<community>` as the title and no author. Any other URL yields `None`.
pub fn aggregator_label(url: &str) -> Option<PathLabel> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if !AGGREGATOR_HOSTS.iter().any(|d| host_matches(host, d)) {
        return None;
    }

    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();
    let community = match segments.as_slice() {
        ["r", community, ..] => format!("r/{}", community),
        _ => return None,
    };

    if let ["r", _, "comments", _id, slug, ..] = segments.as_slice() {
        let decoded = urlencoding::decode(slug)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| slug.to_string());
        let title = humanize(&decoded);
        if !title.is_empty() {
            return Some(PathLabel {
                title,
                author: community,
            });
        }
    }

    Some(PathLabel {
        title: community,
        author: String::new(),
    })
}
