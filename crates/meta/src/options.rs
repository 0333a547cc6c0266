// ABOUTME: Configuration options for the resolver including FaviconStrategy, Options, and ResolverBuilder.
// ABOUTME: ResolverBuilder provides a fluent API for constructing Resolver instances with custom settings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::gate::DEFAULT_MAX_CONCURRENCY;
use crate::oembed::{default_providers, OembedProvider};
use crate::resolver::Resolver;
use crate::resource::{Fetch, DEFAULT_MAX_PAGE_BYTES};

/// Favicon lookup used by a resolver. One strategy per resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaviconStrategy {
    /// Return the declared icon or `<origin>/favicon.ico`, unverified.
    #[default]
    Candidate,
    /// Fetch the icon and return it as a `data:` URI, trying the declared
    /// icon, `<origin>/favicon.ico`, then the favicon service.
    Inline,
}

impl fmt::Display for FaviconStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaviconStrategy::Candidate => "candidate",
            FaviconStrategy::Inline => "inline",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for FaviconStrategy {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "inline" | "data" => FaviconStrategy::Inline,
            _ => FaviconStrategy::Candidate,
        }
    }
}

/// Favicon-by-domain service; `{domain}` is replaced with the page host.
pub const DEFAULT_FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons?domain={domain}&sz=64";

/// Configuration options for the resolver.
#[derive(Clone)]
pub struct Options {
    pub max_concurrency: usize,
    pub max_page_bytes: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub favicon_strategy: FaviconStrategy,
    pub favicon_service: String,
    pub oembed_providers: Vec<OembedProvider>,
    pub site_rules: bool,
    pub http_client: Option<reqwest::Client>,
    pub fetcher: Option<Arc<dyn Fetch>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
            timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (compatible; linkpill/0.1)".to_string(),
            headers: HashMap::new(),
            favicon_strategy: FaviconStrategy::Candidate,
            favicon_service: DEFAULT_FAVICON_SERVICE.to_string(),
            oembed_providers: default_providers(),
            site_rules: true,
            http_client: None,
            fetcher: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("max_concurrency", &self.max_concurrency)
            .field("max_page_bytes", &self.max_page_bytes)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .field("favicon_strategy", &self.favicon_strategy)
            .field("favicon_service", &self.favicon_service)
            .field("oembed_providers", &self.oembed_providers.len())
            .field("site_rules", &self.site_rules)
            .field("custom_fetcher", &self.fetcher.is_some())
            .finish()
    }
}

/// Builder for constructing Resolver instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ResolverBuilder {
    opts: Options,
}

impl ResolverBuilder {
    /// Create a new ResolverBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the number of simultaneous page fetches.
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.opts.max_concurrency = max;
        self
    }

    /// Set the byte cap for page fetches.
    pub fn max_page_bytes(mut self, bytes: usize) -> Self {
        self.opts.max_page_bytes = bytes;
        self
    }

    /// Set the per-request timeout of the built-in HTTP fetcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header of the built-in HTTP fetcher.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to every page request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    pub fn favicon_strategy(mut self, strategy: FaviconStrategy) -> Self {
        self.opts.favicon_strategy = strategy;
        self
    }

    /// Set the favicon-by-domain service template (must contain `{domain}`).
    pub fn favicon_service(mut self, template: impl Into<String>) -> Self {
        self.opts.favicon_service = template.into();
        self
    }

    /// Replace the oEmbed provider table.
    pub fn oembed_providers(mut self, providers: Vec<OembedProvider>) -> Self {
        self.opts.oembed_providers = providers;
        self
    }

    /// Enable or disable hostname-specific title rules.
    pub fn site_rules(mut self, enabled: bool) -> Self {
        self.opts.site_rules = enabled;
        self
    }

    /// Use a custom HTTP client for the built-in fetcher.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Use a custom fetch capability instead of HTTP.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.opts.fetcher = Some(fetcher);
        self
    }

    /// Build the Resolver with the configured options.
    pub fn build(self) -> Result<Resolver, FetchError> {
        Resolver::new(self.opts)
    }
}
