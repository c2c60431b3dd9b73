use super::errors::FetchError;
use crate::credentials::Credentials;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Future returned by a [`FetchFn`].
pub type FetchFuture =
    Pin<Box<dyn Future<Output = Result<Credentials, FetchError>> + Send + 'static>>;

/// Fetch capability backing an [`Updater`](super::Updater).
///
/// The token passed in is cancelled when the caller (or the background loop's
/// owner) gives up; implementations are expected to stop work promptly when it fires.
/// The updater never calls it concurrently from the background loop, but the
/// synchronous read path may race with it, see [`Updater::credentials`](super::Updater::credentials).
pub type FetchFn = Arc<dyn Fn(CancellationToken) -> FetchFuture + Send + Sync + 'static>;

pub(super) fn fetch_fn<F, Fut>(fetch: F) -> FetchFn
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Credentials, FetchError>> + Send + 'static,
{
    Arc::new(move |cancel| Box::pin(fetch(cancel)))
}
