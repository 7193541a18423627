use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::Instant;

use crate::host::{AlertSound, PlaybackError};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[watcher]";

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertAttempt {
    Played,
    /// Inside the debounce window of the previous attempt.
    Debounced,
    Failed(PlaybackError),
}

/// Debounced access to the alert sound.
///
/// The window is keyed to when an attempt started, not to confirmed playback.
/// While the platform keeps blocking audio, attempts stay spaced by the window
/// instead of retrying on every detection.
pub struct AlertGate {
    sound: Arc<dyn AlertSound>,
    window: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl AlertGate {
    pub fn new(sound: Arc<dyn AlertSound>, window: Duration) -> Self {
        Self {
            sound,
            window,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn play(&self) -> AlertAttempt {
        let now = Instant::now();
        {
            let mut last = match self.last_attempt.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.window {
                    log_debug!("alert skipped, last attempt {:?} ago", now - previous);
                    return AlertAttempt::Debounced;
                }
            }
            *last = Some(now);
        }

        match self.sound.play_from_start() {
            Ok(()) => AlertAttempt::Played,
            Err(err) => {
                log_warn!("alert playback failed: {err}");
                AlertAttempt::Failed(err)
            }
        }
    }
}
