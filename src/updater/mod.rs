//! Updater: single-slot credential cache with background refresh.
//!
//! This module provides the [`Updater`] type and its configuration types.
//!
//! An `Updater` starts out empty. The first call to [`Updater::credentials`] (or the
//! first run of the background loop) fetches a credential. Later reads are served
//! from the cache until the credential is within the configured expiry window of
//! expiring, at which point the next read fetches a replacement synchronously.
//!
//! Calling [`Updater::start`] with a non-zero refresh period launches a background
//! task that refreshes ahead of time, so that readers normally never wait on a fetch.
//! Transient fetch failures are retried with a short linear backoff; a
//! [`FetchError::NotEnabled`] failure stops retrying until the next tick.
//!
//! # Example
//!
//! ```no_run
//! use credential_updater::{Credentials, FetchError, Updater, UpdaterOptions};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let updater = Updater::new(
//!     |_cancel: CancellationToken| async move {
//!         Err::<Credentials, _>(FetchError::not_enabled("rrsa is not enabled"))
//!     },
//!     UpdaterOptions {
//!         expiry_window: Duration::from_secs(30),
//!         refresh_period: Duration::from_secs(300),
//!         ..UpdaterOptions::default()
//!     },
//! );
//!
//! let token = CancellationToken::new();
//! updater.start(&token);
//!
//! match updater.credentials(&token).await {
//!     Ok(credentials) => println!("{}", credentials.access_key_id),
//!     Err(e) if e.is_not_enabled() => println!("source not applicable"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod errors;
mod metrics;
mod source;
mod supervisor;
mod types;

pub use builder::{UpdaterBuilder, UpdaterOptions};
pub use errors::{FetchError, MetricsErrorKind, UpdaterError};
pub use metrics::MetricsRecorder;
pub use source::Updater;
pub use types::{FetchFn, FetchFuture};
