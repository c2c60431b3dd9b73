use super::errors::FetchError;
use super::metrics::MetricsRecorder;
use super::source::Updater;
use super::types::{fetch_fn, FetchFn};
use crate::clock::{Clock, SystemClock};
use crate::credentials::Credentials;
use crate::logger::Logger;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options recognized by [`Updater::new`].
///
/// # Examples
///
/// ```rust
/// use credential_updater::UpdaterOptions;
/// use std::time::Duration;
///
/// // Serve credentials until 30s before they expire; check every 5 minutes.
/// let options = UpdaterOptions {
///     expiry_window: Duration::from_secs(30),
///     refresh_period: Duration::from_secs(300),
///     logger: None,
/// };
/// ```
#[derive(Clone, Debug, Default)]
pub struct UpdaterOptions {
    /// Safety margin subtracted from each fetched expiration.
    ///
    /// Readers never receive a credential that expires within this window.
    /// Zero means no margin.
    pub expiry_window: Duration,
    /// Interval between background freshness checks.
    ///
    /// Zero disables the background loop; credentials are then only refreshed
    /// on demand by [`Updater::credentials`].
    pub refresh_period: Duration,
    /// Sink for refresh events. `None` discards them.
    pub logger: Option<Arc<dyn Logger>>,
}

/// Builder for [`Updater`].
///
/// Use this when you need more than [`UpdaterOptions`] offers (custom clock, metrics,
/// shutdown timeout).
///
/// # Example
///
/// ```no_run
/// use credential_updater::{Credentials, FacadeLogger, FetchError, Updater};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// async fn fetch(_cancel: CancellationToken) -> Result<Credentials, FetchError> {
///     Err(FetchError::other("not wired up"))
/// }
///
/// let updater = Updater::builder(fetch)
///     .expiry_window(Duration::from_secs(30))
///     .refresh_period(Duration::from_secs(300))
///     .logger(Arc::new(FacadeLogger))
///     .shutdown_timeout(Some(Duration::from_secs(5)))
///     .build();
/// ```
pub struct UpdaterBuilder {
    fetch: FetchFn,
    expiry_window: Duration,
    refresh_period: Duration,
    logger: Option<Arc<dyn Logger>>,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<Arc<dyn MetricsRecorder>>,
    shutdown_timeout: Option<Duration>,
}

impl Debug for UpdaterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdaterBuilder")
            .field("fetch", &"<FetchFn>")
            .field("expiry_window", &self.expiry_window)
            .field("refresh_period", &self.refresh_period)
            .field("logger", &self.logger)
            .field("clock", &self.clock)
            .field(
                "metrics",
                &self.metrics.as_ref().map(|_| "<MetricsRecorder>"),
            )
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl UpdaterBuilder {
    /// Creates a builder around an async fetch function.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Credentials, FetchError>> + Send + 'static,
    {
        Self::with_fetch_fn(fetch_fn(fetch))
    }

    /// Creates a builder around an already type-erased [`FetchFn`].
    pub fn with_fetch_fn(fetch: FetchFn) -> Self {
        Self {
            fetch,
            expiry_window: Duration::ZERO,
            refresh_period: Duration::ZERO,
            logger: None,
            clock: None,
            metrics: None,
            shutdown_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Sets the serving-side expiry window.
    #[must_use]
    pub fn expiry_window(mut self, window: Duration) -> Self {
        self.expiry_window = window;
        self
    }

    /// Sets the background refresh period. Zero disables the background loop.
    #[must_use]
    pub fn refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    /// Sets the sink for refresh events.
    #[must_use]
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Sets the clock used for expiry checks.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets a metrics recorder.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the timeout used by [`Updater::shutdown_configured`].
    ///
    /// `None` waits indefinitely.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Applies every field of `options`, replacing earlier settings.
    #[must_use]
    pub fn options(mut self, options: UpdaterOptions) -> Self {
        self.expiry_window = options.expiry_window;
        self.refresh_period = options.refresh_period;
        self.logger = options.logger;
        self
    }

    /// Builds the [`Updater`].
    ///
    /// The returned updater holds no credential yet and runs no background task
    /// until [`Updater::start`] is called.
    pub fn build(self) -> Updater {
        Updater::build_with(
            self.fetch,
            self.expiry_window,
            self.refresh_period,
            self.logger,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.metrics,
            self.shutdown_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;

    async fn never(_cancel: CancellationToken) -> Result<Credentials, FetchError> {
        Err(FetchError::not_enabled("test"))
    }

    #[test]
    fn test_defaults() {
        let builder = UpdaterBuilder::new(never);
        assert_eq!(builder.expiry_window, Duration::ZERO);
        assert_eq!(builder.refresh_period, Duration::ZERO);
        assert!(builder.logger.is_none());
        assert!(builder.clock.is_none());
        assert_eq!(builder.shutdown_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_options_override_setters() {
        let builder = UpdaterBuilder::new(never)
            .expiry_window(Duration::from_secs(1))
            .options(UpdaterOptions {
                expiry_window: Duration::from_secs(30),
                refresh_period: Duration::from_secs(60),
                logger: Some(Arc::new(NoopLogger)),
            });
        assert_eq!(builder.expiry_window, Duration::from_secs(30));
        assert_eq!(builder.refresh_period, Duration::from_secs(60));
        assert!(builder.logger.is_some());
    }

    #[test]
    fn test_debug_hides_fetch_fn() {
        let output = format!("{:?}", UpdaterBuilder::new(never));
        assert!(output.contains("<FetchFn>"));
    }
}
