//! Request Cache Module
//!
//! Public cache surface: resolved values bounded by TTL and LRU, plus a
//! single-flight table so concurrent callers for one key share a single
//! factory invocation.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore, MAX_KEY_LENGTH};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, FetchError, Result};

/// Handle every waiter of one in-flight request polls.
type Flight<V, E> = Shared<BoxFuture<'static, std::result::Result<V, Arc<E>>>>;

// == Pending Request ==
struct PendingRequest<V, E> {
    /// Generation of this flight; lets a settling flight detect that it was
    /// invalidated and replaced.
    id: u64,
    flight: Flight<V, E>,
}

// == Shared State ==
struct CacheState<V, E> {
    store: CacheStore<V>,
    pending: HashMap<String, PendingRequest<V, E>>,
    next_flight_id: u64,
}

impl<V: Clone, E> CacheState<V, E> {
    /// Records the outcome of flight `id` for `key`.
    ///
    /// Only the flight still registered for the key writes to the store.
    fn settle(
        &mut self,
        key: &str,
        id: u64,
        outcome: &std::result::Result<V, Arc<E>>,
        ttl: Option<Duration>,
        now: u64,
    ) {
        let registered = self.pending.get(key).is_some_and(|p| p.id == id);

        if outcome.is_err() {
            self.store.stats_mut().record_factory_failure();
        }
        if !registered {
            debug!(key, "flight settled after invalidation, result not cached");
            return;
        }

        self.pending.remove(key);
        if let Ok(value) = outcome {
            self.store.insert(key.to_string(), value.clone(), ttl, now);
        }
    }

    /// Clears flight `id` after its factory panicked, so the next caller for
    /// `key` starts a fresh request.
    fn abandon(&mut self, key: &str, id: u64) {
        self.store.stats_mut().record_factory_failure();
        if self.pending.get(key).is_some_and(|p| p.id == id) {
            self.pending.remove(key);
        }
    }
}

// == Request Cache ==
/// A bounded result cache with in-flight request coalescing.
///
/// `V` is the resolved value type and `E` the factory's error type. Cloning
/// the cache yields another handle to the same state; separately constructed
/// caches never share anything.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use request_cache::{CacheConfig, RequestCache};
///
/// # tokio_test::block_on(async {
/// let cache: RequestCache<Vec<String>, std::io::Error> =
///     RequestCache::new(CacheConfig::new(50, Duration::from_secs(30))).unwrap();
///
/// let concepts = cache
///     .get_or_create("g1:graph theory", || async {
///         Ok(vec!["Graph".to_string(), "Vertex".to_string()])
///     })
///     .await
///     .unwrap();
///
/// assert_eq!(concepts.len(), 2);
/// assert_eq!(cache.get("g1:graph theory"), Some(concepts));
/// # });
/// ```
pub struct RequestCache<V, E> {
    state: Arc<Mutex<CacheState<V, E>>>,
    clock: Arc<dyn Clock>,
}

impl<V, E> Clone for RequestCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<V, E> fmt::Debug for RequestCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCache").finish_non_exhaustive()
    }
}

impl<V, E> RequestCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache on the system clock.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = CacheStore::new(config)?;

        Ok(Self {
            state: Arc::new(Mutex::new(CacheState {
                store,
                pending: HashMap::new(),
                next_flight_id: 0,
            })),
            clock,
        })
    }

    // == Get Or Create ==
    /// Resolves `key`, invoking `factory` only if nothing fresh or in flight exists.
    ///
    /// Uses the configured default TTL for the stored result.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: impl Into<String>,
        factory: F,
    ) -> std::result::Result<V, FetchError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        self.get_or_create_with_ttl(key, None, factory).await
    }

    /// Like [`get_or_create`](Self::get_or_create) with a per-entry TTL override.
    ///
    /// The override applies only if this call starts the request; callers that
    /// join an existing flight inherit the TTL chosen by the caller that started it.
    pub async fn get_or_create_with_ttl<F, Fut>(
        &self,
        key: impl Into<String>,
        ttl: Option<Duration>,
        factory: F,
    ) -> std::result::Result<V, FetchError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let key = key.into();
        validate_key(&key)?;

        let flight = {
            let mut state = self.lock();
            let now = self.clock.now_ms();

            if let Some(value) = state.store.get(&key, now) {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }

            if let Some(pending) = state.pending.get(&key) {
                let flight = pending.flight.clone();
                state.store.stats_mut().record_coalesced();
                debug!(key = %key, "joined in-flight request");
                flight
            } else {
                let id = state.next_flight_id;
                state.next_flight_id += 1;
                state.store.stats_mut().record_factory_call();
                debug!(key = %key, flight = id, "cache miss, invoking factory");

                let flight = self.launch(key.clone(), id, ttl, factory);
                state.pending.insert(
                    key.clone(),
                    PendingRequest {
                        id,
                        flight: flight.clone(),
                    },
                );
                flight
            }
        };

        flight.await.map_err(FetchError::Factory)
    }

    /// Wraps the factory so that whichever waiter drives the flight to
    /// completion also records the outcome.
    ///
    /// The factory runs on first poll, after the state lock is released, so it
    /// may itself read from this cache. A panicking factory is unregistered
    /// before the panic reaches the current waiters.
    fn launch<F, Fut>(
        &self,
        key: String,
        id: u64,
        ttl: Option<Duration>,
        factory: F,
    ) -> Flight<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);

        async move {
            let caught = AssertUnwindSafe(async move { factory().await })
                .catch_unwind()
                .await;
            let outcome = match caught {
                Ok(result) => result.map_err(Arc::new),
                Err(payload) => {
                    warn!(key = %key, flight = id, "factory panicked");
                    state
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .abandon(&key, id);
                    panic::resume_unwind(payload);
                }
            };
            if outcome.is_err() {
                warn!(key = %key, flight = id, "factory failed");
            }

            let now = clock.now_ms();
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .settle(&key, id, &outcome, ttl, now);
            outcome
        }
        .boxed()
        .shared()
    }

    // == Get ==
    /// Returns a live value and marks it most recently used. Never computes.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        self.lock().store.get(key, now)
    }

    // == Set ==
    /// Inserts or overwrites an entry with the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.set_with_ttl(key, value, None)
    }

    /// Inserts or overwrites an entry, bypassing any factory.
    ///
    /// A request already in flight for the key is left alone; when it
    /// settles its result replaces this value.
    pub fn set_with_ttl(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;

        let now = self.clock.now_ms();
        self.lock().store.insert(key, value, ttl, now);
        Ok(())
    }

    // == Invalidate ==
    /// Removes the entry and detaches any in-flight request for `key`.
    ///
    /// Waiters of a detached request still receive its outcome, but the
    /// outcome is not cached. Returns true if anything was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.lock();
        let removed_entry = state.store.remove(key);
        let removed_flight = state.pending.remove(key).is_some();

        if removed_entry || removed_flight {
            debug!(key, removed_entry, removed_flight, "invalidated");
        }
        removed_entry || removed_flight
    }

    // == Size ==
    /// Number of entries not expired at call time.
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.lock().store.live_len(now)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of requests currently in flight.
    ///
    /// A request whose waiters were all dropped still counts: it stays
    /// registered until the next caller for its key resumes it or
    /// [`invalidate`](Self::invalidate) detaches it.
    pub fn in_flight(&self) -> usize {
        self.lock().pending.len()
    }

    /// Drops every stale entry now. Returns the count removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.lock().store.purge_expired(now)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let state = self.lock();
        let mut stats = state.store.stats(now);
        stats.in_flight = state.pending.len();
        stats
    }

    pub fn config(&self) -> CacheConfig {
        self.lock().store.config().clone()
    }

    /// Remaining lifetime of a live entry in milliseconds.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.lock().store.ttl_remaining_ms(key, now)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Key Validation ==
/// Rejects keys the cache should never store under.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
