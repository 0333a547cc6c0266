// ABOUTME: The Resolver: turns a link target into LinkMetadata through oEmbed, a bounded page fetch and the extractors.
// ABOUTME: Deduplicates concurrent lookups per normalized URL and caches successes only.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use scraper::Html;

use crate::error::FetchError;
use crate::extractors::{extract_page, Page};
use crate::flight::{Settled, SingleFlight};
use crate::gate::Gate;
use crate::metadata::LinkMetadata;
use crate::oembed::fetch_oembed;
use crate::options::{FaviconStrategy, Options, ResolverBuilder};
use crate::resource::{is_html, Fetch, FetchRequest, HttpFetcher};
use crate::slug::title_from_url;
use crate::url_norm::{hostname, normalize, origin};

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

fn no_favicon(_: &str) -> String {
    String::new()
}

struct Inner {
    opts: Options,
    fetcher: Arc<dyn Fetch>,
    gate: Arc<Gate>,
    pages: Arc<SingleFlight<LinkMetadata>>,
    favicons: Arc<SingleFlight<String>>,
}

/// Resolves link metadata. Cheap to clone; clones share cache, in-flight
/// table and concurrency gate.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<Inner>,
}

impl Resolver {
    /// Create a new ResolverBuilder for configuring the resolver.
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    /// Create a new Resolver with the given options.
    ///
    /// Fails only when the built-in HTTP client cannot be constructed.
    pub fn new(opts: Options) -> Result<Self, FetchError> {
        let fetcher: Arc<dyn Fetch> = match (&opts.fetcher, &opts.http_client) {
            (Some(fetcher), _) => Arc::clone(fetcher),
            (None, Some(client)) => Arc::new(HttpFetcher::new(client.clone())),
            (None, None) => Arc::new(HttpFetcher::with_settings(
                &opts.user_agent,
                opts.timeout,
            )?),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                gate: Gate::new(opts.max_concurrency),
                pages: SingleFlight::new("pages", LinkMetadata::fallback),
                favicons: SingleFlight::new("favicons", no_favicon),
                fetcher,
                opts,
            }),
        })
    }

    /// Resolve metadata for `url`.
    ///
    /// Never fails. A failed lookup returns the URL-derived fallback, which is
    /// not cached, so a later call retries. Concurrent calls for the same
    /// normalized URL share one lookup. Must be called within a tokio runtime.
    pub async fn resolve(&self, url: &str) -> LinkMetadata {
        let key = normalize(url);
        let inner = Arc::clone(&self.inner);
        let target = key.clone();
        self.inner
            .pages
            .run(&key, move || async move {
                match inner.try_resolve(&target).await {
                    Ok(meta) => Settled::cached(meta),
                    Err(e) => {
                        tracing::warn!(url = %target, error = %e, "resolution failed, using fallback");
                        Settled::uncached(LinkMetadata::fallback(&target))
                    }
                }
            })
            .await
    }

    /// Resolve a batch concurrently. Results are in input order.
    pub async fn resolve_many<S: AsRef<str>>(&self, urls: &[S]) -> Vec<LinkMetadata> {
        join_all(urls.iter().map(|url| self.resolve(url.as_ref()))).await
    }

    /// Cached metadata for `url`, if a previous resolution succeeded.
    /// Starts no work.
    pub fn get_cached(&self, url: &str) -> Option<LinkMetadata> {
        self.inner.pages.get(&normalize(url))
    }

    /// Change the number of simultaneous page fetches.
    pub fn set_max_concurrency(&self, max: usize) {
        self.inner.gate.set_max(max);
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.gate.max()
    }

    /// Drop cached page and favicon results. Lookups in flight still complete
    /// and are cached when they succeed.
    pub fn clear_cache(&self) {
        self.inner.pages.clear();
        self.inner.favicons.clear();
    }

    /// Number of cached page results.
    pub fn cached_len(&self) -> usize {
        self.inner.pages.len()
    }
}

impl Inner {
    fn page_request(&self, url: &str) -> FetchRequest {
        let mut request = FetchRequest::get(url)
            .max_bytes(self.opts.max_page_bytes)
            .header("Accept", PAGE_ACCEPT);
        for (key, value) in &self.opts.headers {
            request = request.header(key.clone(), value.clone());
        }
        request
    }

    async fn try_resolve(self: &Arc<Self>, url: &str) -> Result<LinkMetadata, FetchError> {
        if url::Url::parse(url).is_err() {
            return Err(FetchError::invalid_url(
                url,
                "Resolve",
                Some(anyhow::anyhow!("not an absolute URL")),
            ));
        }

        if let Some(info) = fetch_oembed(self.fetcher.as_ref(), &self.opts.oembed_providers, url).await {
            tracing::debug!(url, "oembed hit");
            let favicon = self.favicon_for(url, None).await;
            return Ok(LinkMetadata::new(info.title, favicon, info.author));
        }

        let response = {
            let _permit = self.gate.acquire().await;
            self.fetcher.fetch(self.page_request(url)).await?
        };

        let media_type = response.content_type();
        if !is_html(&media_type) {
            tracing::debug!(url, content_type = %media_type, "not HTML, titling from URL");
            let favicon = self.favicon_for(url, None).await;
            return Ok(LinkMetadata::new(title_from_url(url), favicon, ""));
        }

        let text = response.text();
        let fields = {
            let doc = Html::parse_document(&text);
            let mut page = Page::new(&doc, url).with_base_url(&response.url);
            page.site_rules = self.opts.site_rules;
            extract_page(&page)
        };

        let favicon = self.favicon_for(url, fields.favicon).await;
        Ok(LinkMetadata::new(fields.title, favicon, fields.author))
    }

    async fn favicon_for(self: &Arc<Self>, page_url: &str, declared: Option<String>) -> String {
        match self.opts.favicon_strategy {
            FaviconStrategy::Candidate => declared
                .or_else(|| origin(page_url).map(|o| format!("{}/favicon.ico", o)))
                .unwrap_or_default(),
            FaviconStrategy::Inline => self.inline_favicon(page_url, declared).await,
        }
    }

    /// First candidate that answers with a non-empty image, as a `data:` URI.
    /// Shared and cached per origin; misses are not cached.
    async fn inline_favicon(self: &Arc<Self>, page_url: &str, declared: Option<String>) -> String {
        let key = match origin(page_url) {
            Some(o) => o,
            None => return String::new(),
        };
        let host = hostname(page_url).unwrap_or_default();

        let mut candidates: Vec<String> = declared.into_iter().collect();
        candidates.push(format!("{}/favicon.ico", key));
        candidates.push(
            self.opts
                .favicon_service
                .replace("{domain}", &urlencoding::encode(&host)),
        );

        let inner = Arc::clone(self);
        let target = key.clone();
        self.favicons
            .run(&key, move || async move {
                for candidate in &candidates {
                    if let Some(data) = inner.inline_icon(candidate).await {
                        return Settled::cached(data);
                    }
                }
                tracing::debug!(origin = %target, "no favicon could be inlined");
                Settled::uncached(String::new())
            })
            .await
    }

    async fn inline_icon(&self, url: &str) -> Option<String> {
        let response = match self.fetcher.fetch(FetchRequest::get(url)).await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url, error = %e, "favicon fetch failed");
                return None;
            }
        };

        let media_type = response.content_type();
        if !media_type.starts_with("image/") || response.body.is_empty() {
            return None;
        }
        Some(format!(
            "data:{};base64,{}",
            media_type,
            STANDARD.encode(&response.body)
        ))
    }
}
