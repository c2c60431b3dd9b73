#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

//! An auto-renewing cache for short-lived cloud access credentials.
//!
//! The primary entry point is [`Updater`], which holds a single credential
//! obtained from a caller-supplied fetch function. Reads are served from the
//! cache; an expired credential is refreshed synchronously, and an optional
//! background task refreshes ahead of expiry so that readers on the happy path
//! never wait on a fetch.
//!
//! ```no_run
//! use credential_updater::{Credentials, FetchError, Updater};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn fetch_from_sts(_: CancellationToken) -> Result<Credentials, FetchError> { todo!() }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let updater = Updater::builder(fetch_from_sts)
//!     .expiry_window(Duration::from_secs(30))
//!     .refresh_period(Duration::from_secs(300))
//!     .build();
//!
//! let token = CancellationToken::new();
//! updater.start(&token);
//!
//! let credentials = updater.credentials(&token).await?;
//! println!("access key id: {}", credentials.access_key_id);
//!
//! token.cancel();
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **`logging`** (default): internal events are emitted as `log` records
//! - **`tracing`**: internal events are emitted as `tracing` events

pub mod clock;
pub mod credentials;
pub mod logger;
pub mod provider;
pub mod updater;

mod observability;
mod prelude;

pub use crate::{
    clock::{Clock, ManualClock, SystemClock},
    credentials::Credentials,
    logger::{FacadeLogger, Logger, NoopLogger},
    provider::CredentialsProvider,
    updater::{
        FetchError, FetchFn, FetchFuture, MetricsErrorKind, MetricsRecorder, Updater,
        UpdaterBuilder, UpdaterError, UpdaterOptions,
    },
};
