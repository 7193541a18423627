use std::{env, path::PathBuf, time::Duration};

use serde::Serialize;

/// Persisted key holding the monitoring switch.
pub const MONITORING_KEY: &str = "isEnabled";

/// Time the coordinator waits after a tab closes before trusting the active tab again.
pub const TAB_REMOVAL_SETTLE: Duration = Duration::from_millis(50);

/// The single page this extension activates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLocation {
    /// Scheme + host, compared against `Url::origin`.
    pub origin: String,
    /// Prefix used to pick tabs that may carry a page watcher.
    pub site_prefix: String,
    /// Client-side route, including the leading `#`, without query.
    pub hash_path: String,
    /// Opened in a new tab from the popup fallback link.
    pub full_url: String,
}

impl Default for TargetLocation {
    fn default() -> Self {
        Self {
            origin: "https://h5.feedov.com".into(),
            site_prefix: "https://h5.feedov.com/".into(),
            hash_path: "#/subpages/tuidanOrder/tuidanOrder".into(),
            full_url: "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder".into(),
        }
    }
}

/// Tunables for the in-page marker scan.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub target: TargetLocation,
    /// Period between marker scans while a session runs.
    pub polling_interval: Duration,
    /// Minimum spacing between two alert attempts.
    pub debounce_window: Duration,
    /// Elements whose text content is compared with `marker_text`.
    pub selector: String,
    /// Trimmed text of the order confirmation button.
    pub marker_text: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            target: TargetLocation::default(),
            polling_interval: Duration::from_millis(5000),
            debounce_window: Duration::from_millis(3000),
            selector: "uni-view".into(),
            marker_text: "确认接单".into(),
        }
    }
}

/// Toolbar icon variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IconState {
    Active,
    Inactive,
}

impl IconState {
    pub fn from_active(active: bool) -> Self {
        if active {
            IconState::Active
        } else {
            IconState::Inactive
        }
    }

    /// Asset paths keyed by pixel size, as the action API expects them.
    pub fn paths(self) -> [(u32, &'static str); 3] {
        match self {
            IconState::Active => [
                (16, "icons/icon16_active.png"),
                (48, "icons/icon48_active.png"),
                (128, "icons/icon128_active.png"),
            ],
            IconState::Inactive => [
                (16, "icons/icon16_inactive.png"),
                (48, "icons/icon48_inactive.png"),
                (128, "icons/icon128_inactive.png"),
            ],
        }
    }
}

/// Settings for the native host process. The target site is not overridable.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub state_path: PathBuf,
    pub alert_path: PathBuf,
    pub alert_volume: f32,
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("orderbell-state.json"),
            alert_path: PathBuf::from("alert.mp3"),
            alert_volume: 1.0,
            debug: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            state_path: env::var_os("ORDERBELL_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            alert_path: env::var_os("ORDERBELL_ALERT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.alert_path),
            alert_volume: defaults.alert_volume,
            debug: env::var("ORDERBELL_DEBUG")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
