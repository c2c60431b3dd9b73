//! Credentials provider trait.

use crate::credentials::Credentials;
use crate::updater::{FetchError, Updater};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Anything that can hand out current credentials.
///
/// Consumers that only need credentials (e.g. request signers) should depend on
/// this trait rather than on [`Updater`] directly.
///
/// ```no_run
/// use credential_updater::{CredentialsProvider, FetchError};
/// use tokio_util::sync::CancellationToken;
///
/// async fn access_key_id(provider: &dyn CredentialsProvider) -> Result<String, FetchError> {
///     let credentials = provider.credentials(&CancellationToken::new()).await?;
///     Ok(credentials.access_key_id.clone())
/// }
/// ```
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Returns credentials that are valid as of now.
    async fn credentials(&self, cancel: &CancellationToken) -> Result<Credentials, FetchError>;
}

#[async_trait]
impl CredentialsProvider for Updater {
    async fn credentials(&self, cancel: &CancellationToken) -> Result<Credentials, FetchError> {
        Updater::credentials(self, cancel).await
    }
}

#[async_trait]
impl<P: CredentialsProvider + ?Sized> CredentialsProvider for Arc<P> {
    async fn credentials(&self, cancel: &CancellationToken) -> Result<Credentials, FetchError> {
        (**self).credentials(cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_updater_as_dyn_provider() {
        let updater = Updater::builder(|_cancel| async {
            Ok(Credentials::new(
                "id",
                "secret",
                None,
                OffsetDateTime::now_utc() + time::Duration::hours(1),
            ))
        })
        .build();

        let provider: Arc<dyn CredentialsProvider> = Arc::new(updater);
        let credentials = provider
            .credentials(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(credentials.access_key_id, "id");
    }
}
