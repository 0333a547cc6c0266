// ABOUTME: Main library entry point for the link pill metadata resolver.
// ABOUTME: Re-exports the public API: Resolver, ResolverBuilder, LinkMetadata, FetchError, ErrorCode, Options.

//! Linkpill - resolves titles, favicons and bylines for bare links.
//!
//! Given a URL, the resolver tries an oEmbed provider, then a bounded fetch of
//! the page head, then falls back to a title derived from the URL itself.
//! Concurrent requests for the same link share one lookup, and successful
//! results are cached for the lifetime of the resolver.
//!
//! # Example
//!
//! ```no_run
//! use linkpill_meta::{FetchError, Resolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FetchError> {
//!     let resolver = Resolver::builder().max_concurrency(2).build()?;
//!     let meta = resolver.resolve("github.com/rust-lang/rust").await;
//!     println!("{} ({})", meta.title, meta.favicon);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod extractors;
pub mod flight;
pub mod gate;
pub mod metadata;
pub mod oembed;
pub mod options;
pub mod resolver;
pub mod resource;
pub mod slug;
pub mod url_norm;

pub use crate::error::{ErrorCode, FetchError};
pub use crate::extractors::site::{SiteRule, SITE_RULES};
pub use crate::metadata::LinkMetadata;
pub use crate::oembed::{default_providers, OembedInfo, OembedProvider};
pub use crate::options::{FaviconStrategy, Options, ResolverBuilder};
pub use crate::resolver::Resolver;
pub use crate::resource::{Fetch, FetchRequest, FetchResponse, Headers, HttpFetcher};
pub use crate::slug::title_from_url;
pub use crate::url_norm::normalize;
