use super::builder::{UpdaterBuilder, UpdaterOptions};
use super::errors::{FetchError, MetricsErrorKind, UpdaterError};
use super::metrics::MetricsRecorder;
use super::types::{fetch_fn, FetchFn};
use crate::clock::{Clock, SystemClock};
use crate::credentials::{normalize_expiration, Credentials};
use crate::logger::{Logger, NoopLogger};
use crate::prelude::{debug, warn};
use arc_swap::ArcSwapOption;
use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Single-slot credential cache with optional background refresh.
///
/// An `Updater` serves one credential identity. It:
/// - Caches the latest credential and hands out copies of it
/// - Refreshes synchronously when a reader finds the credential expired
/// - Optionally refreshes ahead of expiry from a background task (see [`Updater::start`])
///
/// The cached value is replaced atomically; readers never block each other and
/// never observe a partially written credential. Fetches run outside of any lock.
///
/// Cloning an `Updater` is cheap and yields another handle to the same cache.
#[derive(Clone, Debug)]
pub struct Updater {
    inner: Arc<Inner>,
}

pub(super) struct Inner {
    // Atomically replaced, window-adjusted credential. `None` until the first fetch.
    current: ArcSwapOption<Credentials>,
    fetch: FetchFn,

    expiry_window: Duration,
    refresh_period: Duration,
    // Larger window used by the background loop to refresh ahead of readers.
    refresh_window: Duration,

    logger: Arc<dyn Logger>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<dyn MetricsRecorder>>,

    // Lifecycle.
    started: AtomicBool,
    supervisor: Mutex<Option<Supervisor>>,
    shutdown_timeout: Option<Duration>,
}

struct Supervisor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("current", &self.current.load_full())
            .field("fetch", &"<FetchFn>")
            .field("expiry_window", &self.expiry_window)
            .field("refresh_period", &self.refresh_period)
            .field("refresh_window", &self.refresh_window)
            .field("logger", &self.logger)
            .field("clock", &self.clock)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .field("started", &self.started.load(Ordering::Relaxed))
            .field("supervisor", &"<Mutex<Option<JoinHandle<()>>>>")
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl Updater {
    /// Creates an updater from a fetch function and options.
    ///
    /// The updater starts empty; nothing is fetched until the first call to
    /// [`Updater::credentials`] or until the background loop runs.
    pub fn new<F, Fut>(fetch: F, options: UpdaterOptions) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Credentials, FetchError>> + Send + 'static,
    {
        Self::build_with(
            fetch_fn(fetch),
            options.expiry_window,
            options.refresh_period,
            options.logger,
            Arc::new(SystemClock),
            None,
            Some(Duration::from_secs(30)),
        )
    }

    /// Creates a builder for configuring an [`Updater`].
    pub fn builder<F, Fut>(fetch: F) -> UpdaterBuilder
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Credentials, FetchError>> + Send + 'static,
    {
        UpdaterBuilder::new(fetch)
    }

    pub(super) fn build_with(
        fetch: FetchFn,
        expiry_window: Duration,
        refresh_period: Duration,
        logger: Option<Arc<dyn Logger>>,
        clock: Arc<dyn Clock>,
        metrics: Option<Arc<dyn MetricsRecorder>>,
        shutdown_timeout: Option<Duration>,
    ) -> Self {
        let refresh_window = refresh_period.saturating_add(refresh_period / 2);
        let logger = logger.unwrap_or_else(|| Arc::new(NoopLogger));

        Self {
            inner: Arc::new(Inner {
                current: ArcSwapOption::empty(),
                fetch,
                expiry_window,
                refresh_period,
                refresh_window,
                logger,
                clock,
                metrics,
                started: AtomicBool::new(false),
                supervisor: Mutex::new(None),
                shutdown_timeout,
            }),
        }
    }

    /// Starts the background refresh loop.
    ///
    /// The loop runs on the current tokio runtime until `token` (or a shutdown of
    /// this updater) cancels it. It refreshes once immediately, then every refresh
    /// period checks whether the credential is close to expiring.
    ///
    /// This is a no-op if the refresh period is zero. Only the first call has an
    /// effect; later calls are logged and ignored.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime while the refresh period is non-zero.
    pub fn start(&self, token: &CancellationToken) {
        if self.inner.refresh_period.is_zero() {
            debug!("Refresh period is zero; background refresh disabled");
            return;
        }
        if self.inner.started.swap(true, Ordering::AcqRel) {
            warn!("Credential updater already started; ignoring repeated start");
            return;
        }

        let cancel = token.child_token();
        let task_inner = Arc::clone(&self.inner);
        let task_token = cancel.clone();
        let handle = tokio::spawn(async move {
            task_inner.run_refresh_loop(task_token).await;
        });

        *self.inner.lock_supervisor() = Some(Supervisor { cancel, handle });
    }

    /// Returns a copy of the current credential, refreshing it first if expired.
    ///
    /// If the cached credential is still valid (after applying the expiry window) it
    /// is returned without calling the fetch function. Otherwise the fetch function
    /// is called exactly once with `cancel`; on success the new credential is cached
    /// and returned.
    ///
    /// Concurrent callers that all find the credential expired each perform their
    /// own fetch; there is no coalescing on this path.
    ///
    /// # Errors
    ///
    /// Returns the fetch function's error unchanged. The cached credential is left
    /// as it was.
    pub async fn credentials(&self, cancel: &CancellationToken) -> Result<Credentials, FetchError> {
        if let Some(current) = self.inner.current.load_full() {
            if !self.inner.is_expired(&current, Duration::ZERO) {
                return Ok(Credentials::clone(&current));
            }
        }

        let fresh = self.inner.refresh(cancel).await?;
        Ok(Credentials::clone(&fresh))
    }

    /// Returns `true` if no credential is cached or the cached one is expired.
    ///
    /// The expiry window is already applied: this is `now >= expiration - window`.
    pub fn expired(&self) -> bool {
        self.inner.expired_within(Duration::ZERO)
    }

    /// Returns the window-adjusted expiration of the cached credential, if any.
    pub fn expiration(&self) -> Option<OffsetDateTime> {
        self.inner.current_expiration()
    }

    /// Returns `true` while the background refresh loop is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .lock_supervisor()
            .as_ref()
            .is_some_and(|supervisor| !supervisor.handle.is_finished())
    }

    /// Cancels the background loop and waits for it to stop.
    ///
    /// This method is idempotent, and a no-op if the loop was never started.
    ///
    /// **Note:** This method may wait indefinitely if an in-flight fetch ignores its
    /// cancellation token. Use [`Updater::shutdown_with_timeout`] to bound the wait.
    pub async fn shutdown(&self) {
        let Some(supervisor) = self.inner.lock_supervisor().take() else {
            return;
        };
        supervisor.cancel.cancel();

        if let Err(e) = supervisor.handle.await {
            warn!("Error joining refresh task during shutdown: error={e}");
            self.inner
                .record_error(MetricsErrorKind::SupervisorJoinFailed);
        }
    }

    /// Cancels the background loop and waits for it to stop, up to `timeout`.
    ///
    /// If the loop does not stop in time it is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ShutdownTimeout`] if the loop had to be aborted.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<(), UpdaterError> {
        let Some(supervisor) = self.inner.lock_supervisor().take() else {
            return Ok(());
        };
        supervisor.cancel.cancel();
        let mut handle = supervisor.handle;

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("Error joining refresh task during shutdown: error={e}");
                self.inner
                    .record_error(MetricsErrorKind::SupervisorJoinFailed);
                Ok(())
            }
            Err(_) => {
                warn!("Shutdown timeout exceeded; aborting refresh task");
                handle.abort();
                let _unused: Result<_, _> = handle.await;
                Err(UpdaterError::ShutdownTimeout)
            }
        }
    }

    /// Cancels the background loop using the configured shutdown timeout.
    ///
    /// If no timeout was configured, this behaves like [`Updater::shutdown`].
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ShutdownTimeout`] if the configured timeout is exceeded.
    pub async fn shutdown_configured(&self) -> Result<(), UpdaterError> {
        if let Some(timeout) = self.inner.shutdown_timeout {
            self.shutdown_with_timeout(timeout).await
        } else {
            self.shutdown().await;
            Ok(())
        }
    }
}

impl Inner {
    pub(super) const fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    pub(super) const fn refresh_window(&self) -> Duration {
        self.refresh_window
    }

    pub(super) fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    fn lock_supervisor(&self) -> std::sync::MutexGuard<'_, Option<Supervisor>> {
        self.supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the stored (window-adjusted) expiration, if any.
    pub(super) fn current_expiration(&self) -> Option<OffsetDateTime> {
        self.current
            .load()
            .as_ref()
            .map(|credentials| credentials.expiration)
    }

    /// Returns `true` if the stored credential expires within `delta` of now.
    ///
    /// An empty cache always counts as expired.
    pub(super) fn expired_within(&self, delta: Duration) -> bool {
        match self.current.load().as_ref() {
            Some(credentials) => self.is_expired(credentials, delta),
            None => true,
        }
    }

    fn is_expired(&self, credentials: &Credentials, delta: Duration) -> bool {
        let deadline = time::Duration::try_from(delta)
            .ok()
            .and_then(|delta| credentials.expiration.checked_sub(delta));
        match deadline {
            Some(deadline) => self.clock.now() >= deadline,
            None => true,
        }
    }

    /// Calls the fetch function once and stores its result.
    ///
    /// Failures are reported to the logger sink, except for the terminal
    /// "not enabled" condition which is expected for identities the source does
    /// not apply to.
    pub(super) async fn refresh(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Credentials>, FetchError> {
        match (self.fetch)(cancel.clone()).await {
            Ok(credentials) => {
                self.logger.debug(&format!(
                    "refreshed credentials, expiration: {}",
                    credentials.expiration_rfc3339()
                ));
                Ok(self.store(credentials))
            }
            Err(e) if e.is_not_enabled() => {
                self.record_error(MetricsErrorKind::NotEnabled);
                Err(e)
            }
            Err(e) => {
                self.logger
                    .error(&e, &format!("refresh credentials failed: {e}"));
                self.record_error(MetricsErrorKind::FetchFailed);
                Err(e)
            }
        }
    }

    fn store(&self, mut credentials: Credentials) -> Arc<Credentials> {
        credentials.expiration =
            apply_window(normalize_expiration(credentials.expiration), self.expiry_window);

        let stored = Arc::new(credentials);
        self.current.store(Some(Arc::clone(&stored)));
        self.record_refresh();
        stored
    }

    pub(super) fn record_error(&self, kind: MetricsErrorKind) {
        if let Some(metrics) = self.metrics.as_deref() {
            metrics.record_error(kind);
        }
    }

    pub(super) fn record_retry(&self) {
        if let Some(metrics) = self.metrics.as_deref() {
            metrics.record_retry();
        }
    }

    fn record_refresh(&self) {
        if let Some(metrics) = self.metrics.as_deref() {
            metrics.record_refresh();
        }
    }
}

/// Subtracts the expiry window, saturating at the earliest representable time.
fn apply_window(expiration: OffsetDateTime, window: Duration) -> OffsetDateTime {
    time::Duration::try_from(window)
        .ok()
        .and_then(|window| expiration.checked_sub(window))
        .unwrap_or_else(|| PrimitiveDateTime::MIN.assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::AtomicUsize;

    fn epoch() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn credentials_expiring_at(expiration: OffsetDateTime) -> Credentials {
        Credentials::new("id", "secret", Some("token".to_string()), expiration)
    }

    fn updater_with(
        clock: Arc<ManualClock>,
        window: Duration,
        expiration: OffsetDateTime,
        calls: Arc<AtomicUsize>,
    ) -> Updater {
        Updater::builder(move |_cancel| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(credentials_expiring_at(expiration))
            }
        })
        .expiry_window(window)
        .clock(clock)
        .build()
    }

    #[test]
    fn test_apply_window() {
        assert_eq!(apply_window(epoch(), Duration::ZERO), epoch());
        assert_eq!(
            apply_window(epoch(), Duration::from_secs(30)).unix_timestamp(),
            1_700_000_000 - 30
        );
        assert_eq!(
            apply_window(epoch(), Duration::MAX),
            PrimitiveDateTime::MIN.assume_utc()
        );
    }

    #[test]
    fn test_refresh_window_is_one_and_a_half_periods() {
        let updater = Updater::new(
            |_cancel| async { Err(FetchError::not_enabled("test")) },
            UpdaterOptions {
                refresh_period: Duration::from_secs(60),
                ..UpdaterOptions::default()
            },
        );
        assert_eq!(updater.inner.refresh_window(), Duration::from_secs(90));
    }

    #[test]
    fn test_empty_cache_is_expired() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let updater = updater_with(
            clock,
            Duration::ZERO,
            epoch(),
            Arc::new(AtomicUsize::new(0)),
        );
        assert!(updater.expired());
        assert!(updater.expiration().is_none());
    }

    #[tokio::test]
    async fn test_store_normalizes_and_applies_window() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let raw = epoch() + time::Duration::seconds(60) + time::Duration::milliseconds(400);
        let updater = updater_with(
            clock,
            Duration::from_secs(30),
            raw,
            Arc::new(AtomicUsize::new(0)),
        );

        let credentials = updater
            .credentials(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(credentials.expiration.unix_timestamp(), 1_700_000_030);
        assert_eq!(credentials.expiration.nanosecond(), 0);
        assert_eq!(updater.expiration(), Some(credentials.expiration));
    }

    #[tokio::test]
    async fn test_expired_boundary_is_inclusive() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let updater = updater_with(
            Arc::clone(&clock),
            Duration::from_secs(10),
            epoch() + time::Duration::seconds(20),
            Arc::new(AtomicUsize::new(0)),
        );
        updater
            .credentials(&CancellationToken::new())
            .await
            .unwrap();

        clock.set(epoch() + time::Duration::seconds(9));
        assert!(!updater.expired());
        clock.set(epoch() + time::Duration::seconds(10));
        assert!(updater.expired());
    }

    #[tokio::test]
    async fn test_expired_within_uses_larger_delta() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let updater = updater_with(
            clock,
            Duration::ZERO,
            epoch() + time::Duration::seconds(60),
            Arc::new(AtomicUsize::new(0)),
        );
        updater
            .credentials(&CancellationToken::new())
            .await
            .unwrap();

        assert!(!updater.inner.expired_within(Duration::from_secs(59)));
        assert!(updater.inner.expired_within(Duration::from_secs(60)));
        assert!(updater.inner.expired_within(Duration::MAX));
    }

    #[tokio::test]
    async fn test_start_is_noop_without_refresh_period() {
        let updater = updater_with(
            Arc::new(ManualClock::new(epoch())),
            Duration::ZERO,
            epoch(),
            Arc::new(AtomicUsize::new(0)),
        );
        updater.start(&CancellationToken::new());
        assert!(!updater.is_running());
        assert!(!updater.inner.started.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_shutdown_without_start_is_noop() {
        let updater = updater_with(
            Arc::new(ManualClock::new(epoch())),
            Duration::ZERO,
            epoch(),
            Arc::new(AtomicUsize::new(0)),
        );
        updater.shutdown().await;
        assert!(updater
            .shutdown_with_timeout(Duration::from_millis(10))
            .await
            .is_ok());
    }
}
