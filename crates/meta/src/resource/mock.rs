// ABOUTME: In-memory Fetch implementation for tests.
// ABOUTME: Serves canned responses by URL and records call counts and peak concurrency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;

use super::{Fetch, FetchRequest, FetchResponse, Headers};
use crate::error::FetchError;

#[derive(Debug, Clone)]
enum Route {
    Respond { content_type: Option<String>, body: Bytes },
    Fail,
}

/// Canned-response fetcher. Unknown URLs answer 404.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<FetchRequest>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    hold: Option<Arc<Semaphore>>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every fetch blocks until [`MockFetcher::release`] hands it a permit.
    pub(crate) fn held() -> Self {
        Self {
            hold: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub(crate) fn html(&self, url: &str, body: &str) -> &Self {
        self.respond(url, Some("text/html; charset=utf-8"), body.as_bytes())
    }

    pub(crate) fn respond(&self, url: &str, content_type: Option<&str>, body: &[u8]) -> &Self {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route::Respond {
                content_type: content_type.map(str::to_string),
                body: Bytes::copy_from_slice(body),
            },
        );
        self
    }

    pub(crate) fn fail(&self, url: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Fail);
        self
    }

    /// Let `n` held fetches proceed.
    pub(crate) fn release(&self, n: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(n);
        }
    }

    /// Number of fetches issued for `url` (query string included).
    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn lookup(&self, url: &str) -> Option<Route> {
        let routes = self.routes.lock().unwrap();
        routes.get(url).cloned().or_else(|| {
            let without_query = url.split('?').next().unwrap_or(url);
            routes.get(without_query).cloned()
        })
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(hold) = &self.hold {
            if let Ok(permit) = hold.acquire().await {
                permit.forget();
            }
        }
        tokio::task::yield_now().await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.lookup(&request.url) {
            Some(Route::Respond { content_type, body }) => {
                let mut headers = Headers::new();
                if let Some(ct) = content_type {
                    headers.insert("Content-Type", ct);
                }
                let body = match request.max_bytes {
                    Some(max) if body.len() > max => body.slice(..max),
                    _ => body,
                };
                Ok(FetchResponse {
                    status: 200,
                    url: request.url,
                    headers,
                    body,
                })
            }
            Some(Route::Fail) => Err(FetchError::fetch(
                request.url,
                "Fetch",
                Some(anyhow::anyhow!("connection reset")),
            )),
            None => Err(FetchError::status(request.url, "Fetch", 404)),
        }
    }
}
