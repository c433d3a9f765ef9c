//! Keyed query cache using moka
//!
//! Each key owns a slot holding the last value, the last error, a
//! subscriber count and at most one in-flight fetch.
//!
//! - Callers asking for a key while it is loading join the running fetch
//! - Fetches run on their own task, so they finish even if every caller leaves
//! - Invalidation bumps the slot generation; a fetch that started before the
//!   bump stores its value but leaves the slot stale
//! - Failed entries are not refetched in a loop: only invalidation, a new
//!   subscriber or [`RefetchPolicy::MinInterval`] retry them

use crate::error::QueryError;
use crate::key::{QueryFilter, QueryKey};
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskdeck_gateway::GatewayError;
use tokio::time::Instant;

type CachedValue = Arc<dyn Any + Send + Sync>;
type FetchOutcome = Result<CachedValue, GatewayError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Default number of keys kept before eviction
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Entry lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    /// Never fetched
    #[default]
    Idle,
    /// Fetch in progress
    Loading,
    /// Holds a current value
    Success,
    /// Last fetch failed
    Error,
    /// Invalidated; next read refetches
    Stale,
}

/// When a failed entry is fetched again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchPolicy {
    /// Only after invalidation or a new subscriber
    #[default]
    OnInvalidation,
    /// Also once this long has passed since the failure
    MinInterval(Duration),
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of keys
    pub max_entries: u64,
    /// Age after which a successful value is refetched on read
    pub stale_after: Option<Duration>,
    /// Retry behavior for failed entries
    pub refetch: RefetchPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            stale_after: None,
            refetch: RefetchPolicy::OnInvalidation,
        }
    }
}

impl CacheConfig {
    /// Set capacity
    #[inline]
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set value age limit
    #[inline]
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    /// Set retry policy for failures
    #[inline]
    #[must_use]
    pub fn with_refetch(mut self, refetch: RefetchPolicy) -> Self {
        self.refetch = refetch;
        self
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of keys in cache
    pub entry_count: u64,
    /// Reads served from a stored value
    pub hits: u64,
    /// Fetches started
    pub fetches: u64,
    /// Reads that joined a running fetch
    pub joins: u64,
    /// Entries marked stale
    pub invalidations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    fetches: AtomicU64,
    joins: AtomicU64,
    invalidations: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of one key
#[derive(Debug)]
pub struct QueryState<T> {
    /// Lifecycle status
    pub status: QueryStatus,
    /// Last value, kept across refetches and failures
    pub data: Option<Arc<T>>,
    /// Last failure
    pub error: Option<GatewayError>,
    /// When the last fetch settled
    pub updated_at: Option<Instant>,
    /// Live subscriptions
    pub subscribers: usize,
}

impl<T> QueryState<T> {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            subscribers: 0,
        }
    }

    /// Check if a fetch is running
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Check if the last fetch failed
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

enum Step {
    Hit(CachedValue),
    Failed(GatewayError),
    Join { fetch: SharedFetch, current: bool },
    Fetch,
}

#[derive(Default)]
struct SlotState {
    status: QueryStatus,
    value: Option<CachedValue>,
    error: Option<GatewayError>,
    updated_at: Option<Instant>,
    subscribers: usize,
    generation: u64,
    inflight: Option<(u64, SharedFetch)>,
    remount: bool,
}

impl SlotState {
    fn next_step(&self, config: &CacheConfig) -> Step {
        if let Some((generation, fetch)) = &self.inflight {
            return Step::Join {
                fetch: fetch.clone(),
                current: *generation == self.generation,
            };
        }
        match self.status {
            QueryStatus::Success => match (&self.value, config.stale_after, self.updated_at) {
                (Some(_), Some(ttl), Some(at)) if at.elapsed() >= ttl => Step::Fetch,
                (Some(value), ..) => Step::Hit(Arc::clone(value)),
                (None, ..) => Step::Fetch,
            },
            QueryStatus::Error => {
                let interval_passed = match config.refetch {
                    RefetchPolicy::OnInvalidation => false,
                    RefetchPolicy::MinInterval(interval) => {
                        self.updated_at.map_or(true, |at| at.elapsed() >= interval)
                    }
                };
                match &self.error {
                    Some(error) if !self.remount && !interval_passed => Step::Failed(error.clone()),
                    _ => Step::Fetch,
                }
            }
            QueryStatus::Idle | QueryStatus::Loading | QueryStatus::Stale => Step::Fetch,
        }
    }
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
}

impl Slot {
    fn settle(&self, generation: u64, outcome: &FetchOutcome) {
        let mut state = self.state.lock();
        let running = state.inflight.as_ref().map(|(running, _)| *running);
        if running != Some(generation) {
            // Already settled by the task itself
            return;
        }
        state.inflight = None;
        let current = generation == state.generation;
        state.updated_at = Some(Instant::now());
        state.remount = false;
        match outcome {
            Ok(value) => {
                state.value = Some(Arc::clone(value));
                state.error = None;
                state.status = if current {
                    QueryStatus::Success
                } else {
                    QueryStatus::Stale
                };
            }
            Err(error) => {
                state.error = Some(error.clone());
                state.status = if current {
                    QueryStatus::Error
                } else {
                    QueryStatus::Stale
                };
            }
        }
    }

    fn invalidate(&self) -> bool {
        let mut state = self.state.lock();
        state.generation += 1;
        match state.status {
            QueryStatus::Idle => false,
            QueryStatus::Loading => true,
            QueryStatus::Success | QueryStatus::Error | QueryStatus::Stale => {
                state.status = QueryStatus::Stale;
                true
            }
        }
    }

    fn snapshot<T: Send + Sync + 'static>(&self) -> QueryState<T> {
        let state = self.state.lock();
        QueryState {
            status: state.status,
            data: state
                .value
                .as_ref()
                .and_then(|value| Arc::clone(value).downcast::<T>().ok()),
            error: state.error.clone(),
            updated_at: state.updated_at,
            subscribers: state.subscribers,
        }
    }
}

/// Keyed query cache
///
/// Cloning is cheap; clones share slots and statistics.
#[derive(Clone)]
pub struct QueryCache {
    slots: Cache<QueryKey, Arc<Slot>>,
    config: Arc<CacheConfig>,
    counters: Arc<Counters>,
}

impl QueryCache {
    /// Create cache with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create cache with explicit configuration
    #[must_use]
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            slots: Cache::new(config.max_entries),
            config: Arc::new(config),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn slot(&self, key: &QueryKey) -> Arc<Slot> {
        self.slots
            .get_with(key.clone(), async { Arc::new(Slot::default()) })
            .await
    }

    /// Read `key`, fetching it with `fetcher` when no usable value is stored.
    ///
    /// At most one fetch per key runs at a time; concurrent callers share
    /// its outcome and `fetcher` is not called for them. A failure is
    /// stored and returned to later readers until the entry is retried.
    ///
    /// # Errors
    /// [`QueryError::Fetch`] with the stored or fresh gateway failure, or
    /// [`QueryError::TypeMismatch`] when `key` holds a different type.
    pub async fn get<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let slot = self.slot(key).await;

        let fetch = loop {
            let (fetch, current) = {
                let mut state = slot.state.lock();
                match state.next_step(&self.config) {
                    Step::Hit(value) => {
                        Counters::bump(&self.counters.hits);
                        return downcast(key, value);
                    }
                    Step::Failed(source) => {
                        return Err(QueryError::Fetch {
                            key: key.clone(),
                            source,
                        });
                    }
                    Step::Join { fetch, current } => (fetch, current),
                    Step::Fetch => {
                        let generation = state.generation;
                        let fetch = spawn_fetch(Arc::clone(&slot), generation, fetcher());
                        state.status = QueryStatus::Loading;
                        state.inflight = Some((generation, fetch.clone()));
                        state.remount = false;
                        break fetch;
                    }
                }
            };

            Counters::bump(&self.counters.joins);
            tracing::trace!(%key, current, "joining in-flight fetch");
            let outcome = fetch.await;
            if current {
                return settle_outcome(key, outcome);
            }
            // Joined fetch predates an invalidation; look again
        };

        Counters::bump(&self.counters.fetches);
        tracing::debug!(%key, "fetching");
        let outcome = fetch.await;
        if let Err(error) = &outcome {
            tracing::debug!(%key, %error, "fetch failed");
        }
        settle_outcome(key, outcome)
    }

    /// Register interest in `key`. A failed entry becomes eligible for one
    /// retry on the next read.
    pub async fn subscribe(&self, key: &QueryKey) -> Subscription {
        let slot = self.slot(key).await;
        {
            let mut state = slot.state.lock();
            state.subscribers += 1;
            if state.status == QueryStatus::Error {
                state.remount = true;
            }
        }
        Subscription {
            key: key.clone(),
            slot,
        }
    }

    /// Snapshot of `key`; idle if never read
    pub async fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        match self.slots.get(key).await {
            Some(slot) => slot.snapshot(),
            None => QueryState::idle(),
        }
    }

    /// Stored value of `key` without fetching
    pub async fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        self.state::<T>(key).await.data
    }

    /// Mark every matching entry stale; returns how many were affected.
    ///
    /// A fetch already running for a matching key still delivers its value
    /// but leaves the entry stale.
    pub fn invalidate(&self, filter: &QueryFilter) -> usize {
        let mut affected = 0;
        for (key, slot) in self.slots.iter() {
            if filter.matches(&key) && slot.invalidate() {
                affected += 1;
            }
        }
        self.counters
            .invalidations
            .fetch_add(affected as u64, Ordering::Relaxed);
        tracing::debug!(%filter, affected, "invalidated");
        affected
    }

    /// Drop every entry
    pub fn clear(&self) {
        for (_, slot) in self.slots.iter() {
            slot.invalidate();
        }
        self.slots.invalidate_all();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.slots.entry_count(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            joins: self.counters.joins.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Run pending maintenance so `stats().entry_count` is exact
    pub async fn sync(&self) {
        self.slots.run_pending_tasks().await;
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Live interest in a key; released on drop
pub struct Subscription {
    key: QueryKey,
    slot: Arc<Slot>,
}

impl Subscription {
    /// Subscribed key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Snapshot of the subscribed key
    #[must_use]
    pub fn state<T: Send + Sync + 'static>(&self) -> QueryState<T> {
        self.slot.snapshot()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut state = self.slot.state.lock();
        state.subscribers = state.subscribers.saturating_sub(1);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

fn spawn_fetch<T, Fut>(slot: Arc<Slot>, generation: u64, fetch: Fut) -> SharedFetch
where
    T: Send + Sync + 'static,
    Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
{
    let task_slot = Arc::clone(&slot);
    let handle = tokio::spawn(async move {
        let outcome: FetchOutcome = fetch.await.map(|value| Arc::new(value) as CachedValue);
        task_slot.settle(generation, &outcome);
        outcome
    });

    async move {
        match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let outcome = Err(GatewayError::Network(format!("fetch aborted: {join_error}")));
                slot.settle(generation, &outcome);
                outcome
            }
        }
    }
    .boxed()
    .shared()
}

fn settle_outcome<T: Send + Sync + 'static>(
    key: &QueryKey,
    outcome: FetchOutcome,
) -> Result<Arc<T>, QueryError> {
    match outcome {
        Ok(value) => downcast(key, value),
        Err(source) => Err(QueryError::Fetch {
            key: key.clone(),
            source,
        }),
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: CachedValue) -> Result<Arc<T>, QueryError> {
    value.downcast::<T>().map_err(|_| QueryError::TypeMismatch {
        key: key.clone(),
        expected: std::any::type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;

    fn counted(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl Future<Output = Result<u32, GatewayError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = QueryCache::new();
        let key = QueryKey::new("projects");
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get(&key, || counted(&calls, 7)).await.unwrap();
        let second = cache.get(&key, || counted(&calls, 8)).await.unwrap();

        assert_eq!(*first, 7);
        assert_eq!(*second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new();
        let key = QueryKey::new("dashboard-stats");
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            cache.get(&key, || counted(&calls, 1)),
            cache.get(&key, || counted(&calls, 2)),
            cache.get(&key, || counted(&calls, 3)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 1);
        assert_eq!(*c.unwrap(), 1);
        assert_eq!(cache.stats().joins, 2);
    }

    #[tokio::test]
    async fn invalidation_forces_refetch() {
        let cache = QueryCache::new();
        let key = QueryKey::new("tasks").with("project", "p1");
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get(&key, || counted(&calls, 1)).await.unwrap();
        assert_eq!(cache.invalidate(&QueryFilter::resource("tasks")), 1);
        assert_eq!(cache.state::<u32>(&key).await.status, QueryStatus::Stale);

        let value = cache.get(&key, || counted(&calls, 2)).await.unwrap();
        assert_eq!(*value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_entry_keeps_previous_value() {
        let cache = QueryCache::new();
        let key = QueryKey::new("projects");
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get(&key, || counted(&calls, 1)).await.unwrap();
        cache.invalidate(&QueryFilter::all());

        let state = cache.state::<u32>(&key).await;
        assert_eq!(state.data.as_deref(), Some(&1));
    }

    #[tokio::test]
    async fn invalidation_during_fetch_leaves_entry_stale() {
        let cache = QueryCache::new();
        let key = QueryKey::new("tasks");
        let calls = Arc::new(AtomicUsize::new(0));

        let reader = {
            let cache = cache.clone();
            let key = key.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move { cache.get(&key, || counted(&calls, 1)).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.invalidate(&QueryFilter::resource("tasks")), 1);

        let first = reader.await.unwrap().unwrap();
        assert_eq!(*first, 1);
        assert_eq!(cache.state::<u32>(&key).await.status, QueryStatus::Stale);

        let next = cache.get(&key, || counted(&calls, 2)).await.unwrap();
        assert_eq!(*next, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_survives_dropped_caller() {
        let cache = QueryCache::new();
        let key = QueryKey::new("projects");
        let calls = Arc::new(AtomicUsize::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            cache.get(&key, || counted(&calls, 9)),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(40)).await;
        let state = cache.state::<u32>(&key).await;
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.data.as_deref(), Some(&9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_sticky_until_retried() {
        let cache = QueryCache::new();
        let key = QueryKey::new("projects");
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: &Arc<AtomicUsize>| {
            let calls = Arc::clone(calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(GatewayError::from_status(500, ""))
            }
        };

        assert!(cache.get(&key, || failing(&calls)).await.is_err());
        let again = cache.get(&key, || failing(&calls)).await;
        assert!(matches!(again, Err(QueryError::Fetch { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.state::<u32>(&key).await.is_error());

        // A new subscriber allows one retry
        let _subscription = cache.subscribe(&key).await;
        let value = cache.get(&key, || counted(&calls, 4)).await.unwrap();
        assert_eq!(*value, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn min_interval_retries_failures() {
        let cache = QueryCache::with_config(
            CacheConfig::default().with_refetch(RefetchPolicy::MinInterval(Duration::from_secs(10))),
        );
        let key = QueryKey::new("projects");

        let result = cache
            .get(&key, || async { Err::<u32, _>(GatewayError::Network("down".into())) })
            .await;
        assert!(result.is_err());

        let still_failed = cache.get(&key, || async { Ok::<u32, GatewayError>(1) }).await;
        assert!(still_failed.is_err());

        tokio::time::advance(Duration::from_secs(11)).await;
        let recovered = cache.get(&key, || async { Ok::<u32, GatewayError>(1) }).await;
        assert_eq!(*recovered.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_after_refetches_old_values() {
        let cache = QueryCache::with_config(
            CacheConfig::default().with_stale_after(Duration::from_secs(60)),
        );
        let key = QueryKey::new("me");

        cache.get(&key, || async { Ok::<u32, GatewayError>(1) }).await.unwrap();
        let fresh = cache.get(&key, || async { Ok::<u32, GatewayError>(2) }).await.unwrap();
        assert_eq!(*fresh, 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = cache.get(&key, || async { Ok::<u32, GatewayError>(2) }).await.unwrap();
        assert_eq!(*refreshed, 2);
    }

    #[tokio::test]
    async fn subscriptions_are_counted() {
        let cache = QueryCache::new();
        let key = QueryKey::new("projects");

        let a = cache.subscribe(&key).await;
        let b = cache.subscribe(&key).await;
        assert_eq!(a.state::<u32>().subscribers, 2);

        drop(b);
        assert_eq!(cache.state::<u32>(&key).await.subscribers, 1);
        drop(a);
        assert_eq!(cache.state::<u32>(&key).await.subscribers, 0);
    }

    #[tokio::test]
    async fn type_mismatch_is_reported() {
        let cache = QueryCache::new();
        let key = QueryKey::new("projects");

        cache.get(&key, || async { Ok::<u32, GatewayError>(1) }).await.unwrap();
        let wrong = cache
            .get(&key, || async { Ok::<String, GatewayError>(String::new()) })
            .await;

        assert!(matches!(wrong, Err(QueryError::TypeMismatch { .. })));
    }

    #[tokio::test]
    async fn unread_key_is_idle() {
        let cache = QueryCache::new();
        let state = cache.state::<u32>(&QueryKey::new("nothing")).await;
        assert_eq!(state.status, QueryStatus::Idle);
        assert!(state.data.is_none());
    }
}
