use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Messages crossing the component boundary.
///
/// Wire names match what the extension scripts send, so the JSON form can be
/// exchanged with them unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtensionMessage {
    /// Popup → coordinator: the user flipped the switch.
    #[serde(rename = "toggleMonitoring", rename_all = "camelCase")]
    ToggleChanged { is_enabled: bool },
    /// Coordinator → page watcher: authoritative flag push.
    #[serde(rename = "updateMonitoringStatus", rename_all = "camelCase")]
    StateUpdate { is_enabled: bool },
}

/// Text the host attaches to a send that found no listener on the other side.
pub const NO_RECEIVER_MESSAGE: &str = "Could not establish connection. Receiving end does not exist.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Nothing listens in the destination: the watcher is not injected yet, or the
    /// page navigated away.
    #[error("{}", NO_RECEIVER_MESSAGE)]
    NoReceivingEnd,
    #[error("message delivery failed: {0}")]
    Other(String),
}

impl SendError {
    /// Classifies a host error that only carries a description.
    ///
    /// Substring matching is the only discriminator such hosts offer, and it breaks
    /// if the host rewords the message. Hosts with structured error codes should
    /// construct the variants directly.
    pub fn from_host_message(message: &str) -> Self {
        if message.contains("Receiving end does not exist") {
            SendError::NoReceivingEnd
        } else {
            SendError::Other(message.to_string())
        }
    }
}

/// Per-tab result of a fire-and-forget push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    NoEndpoint,
    Failed(String),
}

impl From<Result<(), SendError>> for DeliveryOutcome {
    fn from(result: Result<(), SendError>) -> Self {
        match result {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(SendError::NoReceivingEnd) => DeliveryOutcome::NoEndpoint,
            Err(SendError::Other(reason)) => DeliveryOutcome::Failed(reason),
        }
    }
}
