//! Tagged logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TAG: &str = "[coordinator]";
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("reconciled, on target: {}", on_target);
//! ```
//!
//! Every record is prefixed with the calling module's `LOG_TAG` so the
//! background, page and popup components can be told apart in one stream.

/// Info record, emitted only when the calling module sets `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!("{} {}", LOG_TAG, format_args!($($arg)*))
        }
    };
}

/// Warn record, emitted only when the calling module sets `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!("{} {}", LOG_TAG, format_args!($($arg)*))
        }
    };
}

/// Error record. Failures are never silenced by `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!("{} {}", LOG_TAG, format_args!($($arg)*))
    };
}

/// Debug record for per-tick chatter (scan results, skipped ticks).
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!("{} {}", LOG_TAG, format_args!($($arg)*))
        }
    };
}
