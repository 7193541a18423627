//! Capabilities the extension runtime provides.
//!
//! Each component receives the handful of services it consumes as trait
//! objects, so the native host, a browser binding, or a test can supply them.
//! Calls that cross into the runtime asynchronously (`async fn`) may yield to
//! other queued handlers before they resume.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::IconState;
use crate::messages::{ExtensionMessage, SendError};
use crate::popup::StatusLabel;

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    /// Absent for pages the extension may not inspect.
    pub url: Option<String>,
}

/// Tab and window enumeration.
#[async_trait]
pub trait TabQuery: Send + Sync {
    /// Active tab of the current window.
    async fn active_tab(&self) -> Option<Tab>;
    /// Every open tab whose URL starts with `prefix`.
    async fn tabs_with_prefix(&self, prefix: &str) -> Vec<Tab>;
    /// Opens `url` in a new tab.
    async fn create_tab(&self, url: &str) -> anyhow::Result<Tab>;
}

/// Coordinator → page delivery.
#[async_trait]
pub trait TabMessenger: Send + Sync {
    async fn send_to_tab(&self, tab_id: TabId, message: ExtensionMessage) -> Result<(), SendError>;
}

/// Popup → coordinator delivery.
#[async_trait]
pub trait RuntimeMessenger: Send + Sync {
    async fn send_to_background(&self, message: ExtensionMessage) -> Result<(), SendError>;
}

/// Toolbar icon rendering.
pub trait ToolbarIcon: Send + Sync {
    fn set_icon(&self, state: IconState);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeepAwakeLevel {
    /// Keeps the display and the system awake.
    Display,
}

/// OS power management.
pub trait PowerControl: Send + Sync {
    fn request_keep_awake(&self, level: KeepAwakeLevel) -> anyhow::Result<()>;
    fn release_keep_awake(&self) -> anyhow::Result<()>;
}

/// The page a watcher lives in.
pub trait PageDocument: Send + Sync {
    /// Current `location.hash`, `#` included.
    fn location_hash(&self) -> String;
    /// Raw text content of every element matching `selector`, in document order.
    fn text_contents(&self, selector: &str) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// The platform refuses to start audio before the user interacted with the page.
    #[error("playback blocked until the user interacts with the page")]
    NotAllowed,
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// The alert audio asset.
pub trait AlertSound: Send + Sync {
    /// Rewinds to the start and plays.
    fn play_from_start(&self) -> Result<(), PlaybackError>;
}

/// Rendering surface of the popup.
pub trait PopupView: Send + Sync {
    /// Shows the switch area with the switch set to `checked`.
    fn show_toggle(&self, checked: bool);
    /// Shows the area with the link to the target page.
    fn show_fallback(&self);
    fn set_status(&self, label: &StatusLabel);
    fn close(&self);
}
