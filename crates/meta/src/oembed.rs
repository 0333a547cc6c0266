// ABOUTME: oEmbed lookups for whitelisted media hosts.
// ABOUTME: Matches URLs against provider patterns and reads title/author from the JSON endpoint.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::resource::{Fetch, FetchRequest};

/// One oEmbed provider: URLs matching `pattern` are looked up at `endpoint`.
#[derive(Debug, Clone)]
pub struct OembedProvider {
    pub pattern: Regex,
    pub endpoint: String,
}

impl OembedProvider {
    /// Build a provider from a regex source.
    pub fn new(pattern: &str, endpoint: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            endpoint: endpoint.into(),
        })
    }
}

static BUILTIN_PROVIDERS: Lazy<Vec<OembedProvider>> = Lazy::new(|| {
    [
        (
            r"^https?://(www\.|m\.)?youtube\.com/watch\?",
            "https://www.youtube.com/oembed",
        ),
        (r"^https?://youtu\.be/[\w-]+", "https://www.youtube.com/oembed"),
        (r"^https?://(www\.)?vimeo\.com/\d+", "https://vimeo.com/api/oembed.json"),
    ]
    .into_iter()
    .filter_map(|(pattern, endpoint)| OembedProvider::new(pattern, endpoint).ok())
    .collect()
});

/// The built-in provider table: video watch pages, short links and numeric video IDs.
pub fn default_providers() -> Vec<OembedProvider> {
    BUILTIN_PROVIDERS.clone()
}

/// Title and author from an oEmbed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OembedInfo {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: Option<String>,
    author_name: Option<String>,
}

/// First provider whose pattern matches `url`.
pub fn match_provider<'a>(providers: &'a [OembedProvider], url: &str) -> Option<&'a OembedProvider> {
    providers.iter().find(|p| p.pattern.is_match(url))
}

fn endpoint_url(provider: &OembedProvider, url: &str) -> Option<String> {
    Url::parse_with_params(&provider.endpoint, &[("url", url), ("format", "json")])
        .ok()
        .map(|u| u.to_string())
}

/// Look up `url` through the matching oEmbed provider.
///
/// Returns `None` without network access when no provider matches, and on any
/// fetch or decode failure, or when the response has no usable title.
pub async fn fetch_oembed(
    fetcher: &dyn Fetch,
    providers: &[OembedProvider],
    url: &str,
) -> Option<OembedInfo> {
    let provider = match_provider(providers, url)?;
    let endpoint = endpoint_url(provider, url)?;

    let response = match fetcher.fetch(FetchRequest::get(&endpoint)).await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(url, error = %e, "oembed fetch failed");
            return None;
        }
    };
    let body: OembedResponse = match response.json() {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!(url, error = %e, "oembed response unreadable");
            return None;
        }
    };

    let title = body.title.map(|t| t.trim().to_string())?;
    if title.is_empty() {
        return None;
    }
    Some(OembedInfo {
        title,
        author: body
            .author_name
            .map(|a| a.trim().to_string())
            .unwrap_or_default(),
    })
}
