use super::errors::MetricsErrorKind;
use super::source::Inner;
use crate::credentials::format_timestamp;
use crate::prelude::{debug, info};
use std::time::Duration;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Refresh policy: attempts per tick before giving up until the next one.
pub(super) const MAX_REFRESH_ATTEMPTS: u32 = 5;

/// Linear backoff: wait `attempt` seconds after the zero-based `attempt` failed.
pub(super) const fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(attempt as u64)
}

pub(super) async fn sleep_or_cancel(token: &CancellationToken, dur: Duration) -> bool {
    tokio::select! {
        () = token.cancelled() => true,
        () = sleep(dur) => false,
    }
}

impl Inner {
    pub(super) async fn run_refresh_loop(&self, cancellation_token: CancellationToken) {
        let period = self.refresh_period();
        info!(
            "Starting credentials refresh loop: refresh_period_ms={}, refresh_window_ms={}",
            period.as_millis(),
            self.refresh_window().as_millis()
        );

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if self.refresh_for_loop(&cancellation_token).await {
            debug!("Cancellation signal received; stopping refresh loop");
            return;
        }

        loop {
            tokio::select! {
                () = cancellation_token.cancelled() => {
                    debug!("Cancellation signal received; stopping refresh loop");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if self.refresh_for_loop(&cancellation_token).await {
                debug!("Cancellation signal received; stopping refresh loop");
                return;
            }
        }
    }

    /// Refreshes the credential if it expires within the loop's refresh window.
    ///
    /// Returns `true` if cancelled.
    async fn refresh_for_loop(&self, cancellation_token: &CancellationToken) -> bool {
        if !self.expired_within(self.refresh_window()) {
            return false;
        }

        let current = self
            .current_expiration()
            .map_or_else(|| "none".to_string(), format_timestamp);
        self.logger().debug(&format!(
            "start refresh credentials, current expiration: {current}"
        ));

        for attempt in 0..MAX_REFRESH_ATTEMPTS {
            if cancellation_token.is_cancelled() {
                return true;
            }

            match self.refresh(cancellation_token).await {
                Ok(_) => return false,
                Err(e) if e.is_not_enabled() => return false,
                Err(_) => {}
            }

            if attempt + 1 < MAX_REFRESH_ATTEMPTS {
                self.record_retry();
                if sleep_or_cancel(cancellation_token, retry_backoff(attempt)).await {
                    return true;
                }
            }
        }

        debug!(
            "Credentials refresh failed after {} attempts; waiting for next tick",
            MAX_REFRESH_ATTEMPTS
        );
        self.record_error(MetricsErrorKind::RetriesExhausted);
        false
    }
}
