use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Errors returned by a fetch function.
///
/// [`FetchError::NotEnabled`] is terminal: the credential source does not apply to
/// this identity and retrying will not help. Every other variant is treated as
/// transient.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The credential source is not enabled for this identity.
    #[error("credential source is not enabled: {0}")]
    NotEnabled(String),

    /// The fetch was abandoned because its cancellation token fired.
    #[error("credential fetch cancelled")]
    Cancelled,

    /// Any other failure (network, malformed response, timeout, ...).
    #[error("failed to fetch credentials: {0}")]
    Source(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl FetchError {
    /// Creates a terminal [`FetchError::NotEnabled`] error.
    pub fn not_enabled(reason: impl Into<String>) -> Self {
        Self::NotEnabled(reason.into())
    }

    /// Wraps an arbitrary error as a transient [`FetchError::Source`] error.
    pub fn other(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Source(err.into())
    }

    /// Returns `true` for the terminal "not enabled" condition.
    pub const fn is_not_enabled(&self) -> bool {
        matches!(self, Self::NotEnabled(_))
    }

    /// Returns `true` if retrying may succeed.
    pub const fn is_transient(&self) -> bool {
        !self.is_not_enabled()
    }
}

/// Errors returned by [`Updater`](super::Updater) lifecycle operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdaterError {
    /// Shutdown timeout exceeded.
    ///
    /// The background task did not stop within the timeout given to
    /// `shutdown_with_timeout()` and was aborted.
    #[error("shutdown timeout exceeded")]
    ShutdownTimeout,
}

/// Error kinds for structured metrics reporting.
///
/// Use these stable, low-cardinality labels when recording metrics.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MetricsErrorKind {
    /// A fetch reported that the credential source is not enabled.
    NotEnabled,
    /// A fetch failed with a transient error.
    FetchFailed,
    /// The background loop used up all attempts in one tick.
    RetriesExhausted,
    /// Failed to join the background task during shutdown.
    SupervisorJoinFailed,
}

impl MetricsErrorKind {
    /// Returns a string representation of the error kind.
    ///
    /// This is useful for metrics systems that require string labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEnabled => "not_enabled",
            Self::FetchFailed => "fetch_failed",
            Self::RetriesExhausted => "retries_exhausted",
            Self::SupervisorJoinFailed => "supervisor_join_failed",
        }
    }
}

impl fmt::Display for MetricsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
