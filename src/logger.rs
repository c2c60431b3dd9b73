//! Logging sinks for refresh events.
//!
//! An [`Updater`](crate::Updater) reports fetch outcomes to a [`Logger`]. When none
//! is configured it uses a [`NoopLogger`] created alongside it. [`FacadeLogger`]
//! forwards to whichever logging backend the crate was built with (`log` or
//! `tracing`).

use crate::prelude::{debug, error, info};
use std::error::Error;
use std::fmt::Debug;

/// Receiver of refresh events.
pub trait Logger: Send + Sync + Debug {
    /// Records a debug-level message.
    fn debug(&self, msg: &str);

    /// Records an info-level message.
    fn info(&self, msg: &str);

    /// Records a failure together with its cause.
    fn error(&self, err: &(dyn Error + 'static), msg: &str);
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _msg: &str) {}

    fn info(&self, _msg: &str) {}

    fn error(&self, _err: &(dyn Error + 'static), _msg: &str) {}
}

/// Logger that forwards to the crate's logging backend.
///
/// With the `tracing` feature events are emitted through `tracing`, with the
/// `logging` feature through `log`; with neither enabled messages are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn debug(&self, msg: &str) {
        debug!("{}", msg);
    }

    fn info(&self, msg: &str) {
        info!("{}", msg);
    }

    fn error(&self, err: &(dyn Error + 'static), msg: &str) {
        error!("{}: error={}", msg, err);
    }
}
