use std::{sync::Arc, time::Duration};

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::controller::WatcherCore;

/// One recurring marker scan. Dropping the session cancels it.
pub struct PollingSession {
    cancel_token: CancellationToken,
}

impl PollingSession {
    /// Spawns the timer on the current tokio runtime. The first scan happens one
    /// full period after the start.
    pub(crate) fn start(core: Arc<WatcherCore>, period: Duration) -> Self {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        core.check_for_marker();
                    }
                }
            }
        });

        Self { cancel_token }
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
