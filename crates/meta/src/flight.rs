// ABOUTME: Keyed single-flight table with a success-only cache.
// ABOUTME: Concurrent callers for one key share a spawned task; only cacheable results are kept.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};

/// Outcome of one run: the value handed to every waiter, and whether it may be cached.
#[derive(Debug, Clone)]
pub struct Settled<V> {
    pub value: V,
    pub cache: bool,
}

impl<V> Settled<V> {
    pub fn cached(value: V) -> Self {
        Self { value, cache: true }
    }

    pub fn uncached(value: V) -> Self {
        Self {
            value,
            cache: false,
        }
    }
}

type Pending<V> = Shared<BoxFuture<'static, V>>;

struct FlightState<V> {
    done: HashMap<String, V>,
    pending: HashMap<String, Pending<V>>,
}

/// Cache plus in-flight table behind one lock, so a lookup and the insertion
/// of a new pending run are a single step.
pub struct SingleFlight<V> {
    name: &'static str,
    fallback: fn(&str) -> V,
    state: Mutex<FlightState<V>>,
}

impl<V> SingleFlight<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// `fallback` produces the value for a key whose task panicked.
    pub fn new(name: &'static str, fallback: fn(&str) -> V) -> Arc<Self> {
        Arc::new(Self {
            name,
            fallback,
            state: Mutex::new(FlightState {
                done: HashMap::new(),
                pending: HashMap::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FlightState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached value for `key`, without touching pending runs.
    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().done.get(key).cloned()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.lock().pending.contains_key(key)
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.lock().done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached value. Pending runs are untouched.
    pub fn clear(&self) {
        self.lock().done.clear();
    }

    fn settle(&self, key: &str, settled: &Settled<V>) {
        let mut state = self.lock();
        state.pending.remove(key);
        if settled.cache {
            state.done.insert(key.to_string(), settled.value.clone());
        }
    }

    /// Value for `key`: cached, joined from a pending run, or produced by a
    /// new run of `start`.
    ///
    /// New runs are spawned, so they finish even if every caller goes away.
    /// Must be called from within a tokio runtime.
    pub async fn run<F, Fut>(self: &Arc<Self>, key: &str, start: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Settled<V>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            if let Some(value) = state.done.get(key) {
                tracing::debug!(table = self.name, key, "cache hit");
                return value.clone();
            }
            match state.pending.get(key) {
                Some(pending) => {
                    tracing::debug!(table = self.name, key, "joining in-flight run");
                    pending.clone()
                }
                None => {
                    let work = start();
                    let this = Arc::clone(self);
                    let owned = key.to_string();
                    let handle = tokio::spawn(async move {
                        let settled = work.await;
                        this.settle(&owned, &settled);
                        settled.value
                    });

                    let this = Arc::clone(self);
                    let owned = key.to_string();
                    let pending = async move {
                        match handle.await {
                            Ok(value) => value,
                            Err(e) => {
                                tracing::warn!(table = this.name, key = %owned, error = %e, "run aborted");
                                this.lock().pending.remove(&owned);
                                (this.fallback)(&owned)
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    state.pending.insert(key.to_string(), pending.clone());
                    pending
                }
            }
        };
        pending.await
    }
}
