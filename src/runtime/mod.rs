//! In-process extension runtime.
//!
//! Hosts the coordinator, one watcher per loaded page and the popup in a single
//! tokio runtime. Browser events arrive as JSON lines; icon, tab and popup
//! updates leave as JSON lines.

pub mod bridge;
pub mod events;
pub mod hub;
pub mod tabs;

pub use bridge::ExtensionRuntime;
pub use events::{Emitter, HostEvent, HostOutput, PageElement};
pub use hub::{SnapshotDocument, WatcherHub};
pub use tabs::TabRegistry;
