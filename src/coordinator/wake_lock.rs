use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::host::{KeepAwakeLevel, PowerControl};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[coordinator]";

use crate::{log_error, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum WakeLockState {
    #[default]
    Released,
    Display,
}

impl From<KeepAwakeLevel> for WakeLockState {
    fn from(level: KeepAwakeLevel) -> Self {
        match level {
            KeepAwakeLevel::Display => WakeLockState::Display,
        }
    }
}

/// Proxy for the OS keep-awake request. At most one request is outstanding.
pub struct WakeLock {
    power: Arc<dyn PowerControl>,
    state: Mutex<WakeLockState>,
}

impl WakeLock {
    pub fn new(power: Arc<dyn PowerControl>) -> Self {
        Self {
            power,
            state: Mutex::new(WakeLockState::Released),
        }
    }

    pub fn state(&self) -> WakeLockState {
        *self.lock()
    }

    /// Requests `level` unless it is already held.
    pub fn request(&self, level: KeepAwakeLevel) {
        let mut state = self.lock();
        let wanted = WakeLockState::from(level);
        if *state == wanted {
            return;
        }

        match self.power.request_keep_awake(level) {
            Ok(()) => {
                *state = wanted;
                log_info!("requested keep-awake ({level:?})");
            }
            Err(err) => log_error!("keep-awake request failed: {err:#}"),
        }
    }

    /// Releases the outstanding request, if any.
    pub fn release(&self) {
        let mut state = self.lock();
        if *state == WakeLockState::Released {
            return;
        }

        if let Err(err) = self.power.release_keep_awake() {
            log_error!("keep-awake release failed: {err:#}");
        }
        // A failed release is not retried.
        *state = WakeLockState::Released;
        log_info!("released keep-awake");
    }

    fn lock(&self) -> MutexGuard<'_, WakeLockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
