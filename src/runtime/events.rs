use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{config::IconState, coordinator::TabStatus, host::TabId};

/// One element of a page snapshot: a tag name and its raw text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageElement {
    pub selector: String,
    pub text: String,
}

/// Events fed to the native host, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostEvent {
    Installed,
    Startup,
    TabUpdated {
        tab_id: TabId,
        status: TabStatus,
        #[serde(default)]
        url: Option<String>,
    },
    TabActivated {
        tab_id: TabId,
    },
    TabRemoved {
        tab_id: TabId,
    },
    /// A page on the target site loaded and its watcher is ready.
    PageLoaded {
        tab_id: TabId,
        hash: String,
    },
    PageSnapshot {
        tab_id: TabId,
        elements: Vec<PageElement>,
    },
    RouteChanged {
        tab_id: TabId,
        hash: String,
    },
    PageUnloaded {
        tab_id: TabId,
    },
    PopupOpened,
    PopupToggled {
        enabled: bool,
    },
    PopupLinkClicked,
}

/// What the host renders or reports, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "output", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostOutput {
    IconChanged {
        state: IconState,
        paths: [(u32, &'static str); 3],
    },
    TabCreated {
        tab_id: TabId,
        url: String,
    },
    PopupToggle {
        checked: bool,
    },
    PopupFallback,
    PopupStatus {
        text: &'static str,
        color: &'static str,
    },
    PopupClosed,
    AlertPlayed {
        tab_id: TabId,
        at: DateTime<Utc>,
    },
}

#[derive(Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<HostOutput>,
}

impl Emitter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostOutput>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, output: HostOutput) {
        // Receiver gone means the host is shutting down.
        let _ = self.tx.send(output);
    }
}
