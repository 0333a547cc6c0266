// ABOUTME: Fetch capability consumed by the resolver: request/response types, the Fetch trait,
// ABOUTME: and the reqwest-backed HttpFetcher with byte caps, case-insensitive headers and charset decoding.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

#[cfg(test)]
pub(crate) mod mock;

/// Default byte cap for page fetches: only the head of a document matters.
pub const DEFAULT_MAX_PAGE_BYTES: usize = 50 * 1024;

/// Content type assumed when a response carries no `content-type` header.
pub const DEFAULT_CONTENT_TYPE: &str = "image/x-icon";

/// Response headers with keys normalized to lowercase at ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value under the same (case-folded) name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// Media type of a response: parameters after `;` dropped, lowercased,
/// [`DEFAULT_CONTENT_TYPE`] when the header is missing or blank.
pub fn content_type(headers: &Headers) -> String {
    headers
        .get("content-type")
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

/// Returns true for media types the HTML extractors can work with.
pub fn is_html(media_type: &str) -> bool {
    media_type == "text/html" || media_type == "application/xhtml+xml"
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: reqwest::Method,
    pub headers: HashMap<String, String>,
    /// Cap on the body size. When set, a `Range` header is sent and the body
    /// is truncated at this many bytes even if the server ignores the range.
    pub max_bytes: Option<usize>,
}

impl FetchRequest {
    /// A plain GET with no byte cap.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: reqwest::Method::GET,
            headers: HashMap::new(),
            max_bytes: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

/// A completed response with a 2xx status.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after redirects.
    pub url: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl FetchResponse {
    /// Media type from the response headers (see [`content_type`]).
    pub fn content_type(&self) -> String {
        content_type(&self.headers)
    }

    /// Decode the body as text, using the charset from the content-type header or detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.headers.get("content-type"))
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            FetchError::decode(
                &self.url,
                "Json",
                Some(anyhow::anyhow!("invalid JSON: {}", e)),
            )
        })
    }
}

/// The HTTP capability the resolver depends on.
///
/// Implementations report transport failures and non-2xx statuses as errors.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// [`Fetch`] implementation backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Wrap an already configured client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client with the given User-Agent and per-request timeout.
    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| {
                FetchError::fetch(
                    "",
                    "BuildClient",
                    Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                )
            })?;
        Ok(Self { client })
    }
}

fn map_reqwest_error(url: &str, op: &str, context: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::timeout(url, op, Some(anyhow::anyhow!("{}: {}", context, e)))
    } else {
        FetchError::fetch(url, op, Some(anyhow::anyhow!("{}: {}", context, e)))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = request.url.as_str();
        let parsed_url = url::Url::parse(url).map_err(|e| {
            FetchError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let scheme = parsed_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::invalid_url(
                url,
                "Fetch",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        let mut builder = self.client.request(request.method.clone(), parsed_url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(max) = request.max_bytes {
            builder = builder.header(
                reqwest::header::RANGE,
                format!("bytes=0-{}", max.saturating_sub(1)),
            );
        }

        let mut response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, "Fetch", "request failed", e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        if !(200..300).contains(&status) {
            return Err(FetchError::status(url, "Fetch", status));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(url, "Fetch", "failed to read body", e))?
        {
            body.extend_from_slice(&chunk);
            if let Some(max) = request.max_bytes {
                if body.len() >= max {
                    body.truncate(max);
                    break;
                }
            }
        }

        Ok(FetchResponse {
            status,
            url: final_url,
            headers,
            body: body.freeze(),
        })
    }
}
