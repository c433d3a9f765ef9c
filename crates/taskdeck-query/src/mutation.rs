//! Mutation coordination
//!
//! A [`Mutation`] describes one kind of write: its label, the cache entries
//! it makes stale and the message shown when the server gives none. The
//! [`MutationCoordinator`] runs the write, invalidates on success before
//! returning, and reports the outcome through a [`Notifier`].

use crate::cache::QueryCache;
use crate::error::MutationError;
use crate::key::QueryFilter;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use taskdeck_gateway::GatewayError;

/// Mutation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    /// Not run yet
    #[default]
    Idle,
    /// Request in flight
    Pending,
    /// Last run succeeded
    Success,
    /// Last run failed
    Error,
}

/// User-facing outcome reporting (toasts, status lines)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Report a completed write
    fn success(&self, message: &str);

    /// Report a failed write
    fn error(&self, message: &str);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!(message, "mutation succeeded");
    }

    fn error(&self, message: &str) {
        tracing::warn!(message, "mutation failed");
    }
}

#[derive(Debug, Default)]
struct Record {
    status: MutationStatus,
    last_error: Option<MutationError>,
    runs: u64,
}

/// One kind of write with its invalidation set.
///
/// Clones share status, so a form and the code submitting it see the same
/// pending flag.
#[derive(Debug, Clone)]
pub struct Mutation {
    label: String,
    invalidates: Vec<QueryFilter>,
    fallback_message: String,
    success_message: Option<String>,
    record: Arc<Mutex<Record>>,
}

impl Mutation {
    /// New mutation; the fallback message defaults to "`<label>` failed"
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            fallback_message: format!("{label} failed"),
            label,
            invalidates: Vec::new(),
            success_message: None,
            record: Arc::new(Mutex::new(Record::default())),
        }
    }

    /// Mark entries matching `filter` stale on success
    #[inline]
    #[must_use]
    pub fn invalidating(mut self, filter: QueryFilter) -> Self {
        self.invalidates.push(filter);
        self
    }

    /// Message used when the server supplies none
    #[inline]
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Message announced on success
    #[inline]
    #[must_use]
    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Filters invalidated on success
    #[inline]
    #[must_use]
    pub fn invalidates(&self) -> &[QueryFilter] {
        &self.invalidates
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> MutationStatus {
        self.record.lock().status
    }

    /// Check if a run is in flight
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status() == MutationStatus::Pending
    }

    /// Failure of the last run
    #[must_use]
    pub fn last_error(&self) -> Option<MutationError> {
        self.record.lock().last_error.clone()
    }

    /// Completed runs
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.record.lock().runs
    }

    /// Back to idle, clearing the last error
    pub fn reset(&self) {
        let mut record = self.record.lock();
        if record.status != MutationStatus::Pending {
            record.status = MutationStatus::Idle;
            record.last_error = None;
        }
    }

    fn begin(&self) -> Result<PendingGuard<'_>, MutationError> {
        let mut record = self.record.lock();
        if record.status == MutationStatus::Pending {
            return Err(MutationError::InFlight {
                label: self.label.clone(),
            });
        }
        record.status = MutationStatus::Pending;
        record.last_error = None;
        Ok(PendingGuard {
            mutation: self,
            settled: false,
        })
    }
}

/// Resets a pending mutation whose caller went away mid-request
struct PendingGuard<'a> {
    mutation: &'a Mutation,
    settled: bool,
}

impl PendingGuard<'_> {
    fn settle(mut self, outcome: Result<(), MutationError>) {
        let mut record = self.mutation.record.lock();
        record.runs += 1;
        match outcome {
            Ok(()) => record.status = MutationStatus::Success,
            Err(error) => {
                record.status = MutationStatus::Error;
                record.last_error = Some(error);
            }
        }
        self.settled = true;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut record = self.mutation.record.lock();
            if record.status == MutationStatus::Pending {
                record.status = MutationStatus::Idle;
            }
        }
    }
}

/// Runs writes against the shared cache
#[derive(Clone)]
pub struct MutationCoordinator {
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl MutationCoordinator {
    /// Coordinator that reports through the log only
    #[must_use]
    pub fn new(cache: QueryCache) -> Self {
        Self::with_notifier(cache, Arc::new(LogNotifier))
    }

    /// Coordinator with a custom notifier
    #[must_use]
    pub fn with_notifier(cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    /// Shared cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run `operation` as `mutation`.
    ///
    /// # Errors
    /// [`MutationError::InFlight`] if `mutation` is already pending, otherwise
    /// the classified gateway failure. Nothing is invalidated on failure.
    pub async fn mutate<T, Fut>(&self, mutation: &Mutation, operation: Fut) -> Result<T, MutationError>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        self.mutate_invalidating(mutation, &[], operation).await
    }

    /// As [`MutationCoordinator::mutate`], also invalidating `extra` on
    /// success (keys that depend on the call, such as a single task).
    ///
    /// # Errors
    /// See [`MutationCoordinator::mutate`].
    pub async fn mutate_invalidating<T, Fut>(
        &self,
        mutation: &Mutation,
        extra: &[QueryFilter],
        operation: Fut,
    ) -> Result<T, MutationError>
    where
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let pending = mutation.begin()?;
        tracing::debug!(label = mutation.label(), "mutation started");

        match operation.await {
            Ok(value) => {
                let affected: usize = mutation
                    .invalidates
                    .iter()
                    .chain(extra)
                    .map(|filter| self.cache.invalidate(filter))
                    .sum();
                pending.settle(Ok(()));
                tracing::info!(label = mutation.label(), affected, "mutation succeeded");
                if let Some(message) = &mutation.success_message {
                    self.notifier.success(message);
                }
                Ok(value)
            }
            Err(err) => {
                let error = MutationError::from_gateway(&err, &mutation.fallback_message);
                tracing::warn!(label = mutation.label(), error = %err, "mutation failed");
                pending.settle(Err(error.clone()));
                self.notifier.error(&error.message());
                Err(error)
            }
        }
    }
}

impl fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryStatus;
    use crate::key::QueryKey;

    async fn seed(cache: &QueryCache, key: &QueryKey) {
        cache
            .get(key, || async { Ok::<u32, GatewayError>(1) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn success_invalidates_before_returning() {
        let cache = QueryCache::new();
        let tasks = QueryKey::new("tasks").with("project", "p1");
        let projects = QueryKey::new("projects");
        seed(&cache, &tasks).await;
        seed(&cache, &projects).await;

        let coordinator = MutationCoordinator::new(cache.clone());
        let mutation = Mutation::new("Create task").invalidating(QueryFilter::resource("tasks"));

        let created = coordinator
            .mutate(&mutation, async { Ok::<_, GatewayError>("t1") })
            .await
            .unwrap();

        assert_eq!(created, "t1");
        assert_eq!(cache.state::<u32>(&tasks).await.status, QueryStatus::Stale);
        assert_eq!(cache.state::<u32>(&projects).await.status, QueryStatus::Success);
        assert_eq!(mutation.status(), MutationStatus::Success);
    }

    #[tokio::test]
    async fn failure_invalidates_nothing_and_notifies() {
        let cache = QueryCache::new();
        let tasks = QueryKey::new("tasks");
        seed(&cache, &tasks).await;

        let mut notifier = MockNotifier::new();
        notifier
            .expect_error()
            .withf(|message| message == "Task title already exists")
            .times(1)
            .return_const(());
        let coordinator = MutationCoordinator::with_notifier(cache.clone(), Arc::new(notifier));
        let mutation = Mutation::new("Create task").invalidating(QueryFilter::resource("tasks"));

        let result = coordinator
            .mutate(&mutation, async {
                Err::<(), _>(GatewayError::from_status(
                    409,
                    r#"{"message":"Task title already exists"}"#,
                ))
            })
            .await;

        assert!(matches!(result, Err(MutationError::Conflict { .. })));
        assert_eq!(cache.state::<u32>(&tasks).await.status, QueryStatus::Success);
        assert_eq!(mutation.status(), MutationStatus::Error);
        assert!(mutation.last_error().is_some());
    }

    #[tokio::test]
    async fn fallback_message_when_server_is_silent() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_error()
            .withf(|message| message == "Delete failed")
            .times(1)
            .return_const(());
        let coordinator = MutationCoordinator::with_notifier(QueryCache::new(), Arc::new(notifier));
        let mutation = Mutation::new("Delete project").with_fallback_message("Delete failed");

        let result = coordinator
            .mutate(&mutation, async { Err::<(), _>(GatewayError::from_status(500, "")) })
            .await;

        assert_eq!(
            result,
            Err(MutationError::Server {
                message: "Delete failed".to_string()
            })
        );
    }

    #[tokio::test]
    async fn success_message_is_announced() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_success()
            .withf(|message| message == "Project deleted")
            .times(1)
            .return_const(());
        let coordinator = MutationCoordinator::with_notifier(QueryCache::new(), Arc::new(notifier));
        let mutation = Mutation::new("Delete project").with_success_message("Project deleted");

        coordinator
            .mutate(&mutation, async { Ok::<_, GatewayError>(()) })
            .await
            .unwrap();
        assert_eq!(mutation.runs(), 1);
    }

    #[tokio::test]
    async fn resubmission_while_pending_is_rejected() {
        let coordinator = MutationCoordinator::new(QueryCache::new());
        let mutation = Mutation::new("Update task");
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let first = coordinator.mutate(&mutation, async {
            wait.await.ok();
            Ok::<_, GatewayError>(1)
        });
        let second = async {
            tokio::task::yield_now().await;
            assert!(mutation.is_pending());
            let rejected = coordinator
                .mutate(&mutation, async { Ok::<_, GatewayError>(2) })
                .await;
            release.send(()).ok();
            rejected
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, Ok(1));
        assert_eq!(
            second,
            Err(MutationError::InFlight {
                label: "Update task".to_string()
            })
        );
    }

    #[tokio::test]
    async fn dropped_run_returns_to_idle() {
        let coordinator = MutationCoordinator::new(QueryCache::new());
        let mutation = Mutation::new("Update task");

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(5),
            coordinator.mutate(&mutation, futures::future::pending::<Result<(), GatewayError>>()),
        )
        .await;

        assert!(abandoned.is_err());
        assert_eq!(mutation.status(), MutationStatus::Idle);
    }

    #[tokio::test]
    async fn extra_filters_are_invalidated() {
        let cache = QueryCache::new();
        let task = QueryKey::new("task").with("id", "t1");
        let other = QueryKey::new("task").with("id", "t2");
        seed(&cache, &task).await;
        seed(&cache, &other).await;

        let coordinator = MutationCoordinator::new(cache.clone());
        let mutation = Mutation::new("Update task");
        coordinator
            .mutate_invalidating(&mutation, &[QueryFilter::exact(&task)], async {
                Ok::<_, GatewayError>(())
            })
            .await
            .unwrap();

        assert_eq!(cache.state::<u32>(&task).await.status, QueryStatus::Stale);
        assert_eq!(cache.state::<u32>(&other).await.status, QueryStatus::Success);
    }
}
