use super::errors::MetricsErrorKind;

/// Trait for recording metrics from an [`Updater`](super::Updater).
///
/// Implement this trait to integrate with your metrics system (e.g., Prometheus, `StatsD`).
/// Prefer stable, low-cardinality labels when recording metrics.
///
/// # Example
///
/// ```no_run
/// use credential_updater::{MetricsErrorKind, MetricsRecorder};
/// use std::sync::Arc;
///
/// struct MyMetrics;
///
/// impl MetricsRecorder for MyMetrics {
///     fn record_refresh(&self) {}
///
///     fn record_retry(&self) {}
///
///     fn record_error(&self, kind: MetricsErrorKind) {
///         println!("Error: {}", kind.as_str());
///     }
/// }
///
/// let metrics = Arc::new(MyMetrics);
/// // Use with UpdaterBuilder::metrics()
/// ```
pub trait MetricsRecorder: Send + Sync {
    /// Records that a freshly fetched credential was stored.
    fn record_refresh(&self);

    /// Records that the background loop is about to back off and retry a failed fetch.
    fn record_retry(&self);

    /// Records an error with a structured error kind.
    fn record_error(&self, kind: MetricsErrorKind);
}
