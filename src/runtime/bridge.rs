use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    config::{IconState, TargetLocation, WatcherConfig},
    coordinator::{Coordinator, CoordinatorServices},
    host::{AlertSound, PopupView, PowerControl, RuntimeMessenger, ToolbarIcon},
    messages::{ExtensionMessage, SendError},
    popup::{PopupServices, StatusLabel, ToggleUi},
    settings::StateStore,
};

use super::{
    events::{Emitter, HostEvent, HostOutput},
    hub::WatcherHub,
    tabs::TabRegistry,
};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[runtime]";

use crate::{log_error, log_info, log_warn};

struct EmittingIcon(Emitter);

impl ToolbarIcon for EmittingIcon {
    fn set_icon(&self, state: IconState) {
        self.0.emit(HostOutput::IconChanged {
            state,
            paths: state.paths(),
        });
    }
}

struct EmittingPopupView(Emitter);

impl PopupView for EmittingPopupView {
    fn show_toggle(&self, checked: bool) {
        self.0.emit(HostOutput::PopupToggle { checked });
    }

    fn show_fallback(&self) {
        self.0.emit(HostOutput::PopupFallback);
    }

    fn set_status(&self, label: &StatusLabel) {
        self.0.emit(HostOutput::PopupStatus {
            text: label.text,
            color: label.color,
        });
    }

    fn close(&self) {
        self.0.emit(HostOutput::PopupClosed);
    }
}

/// Popup → background channel. Delivery returns before the coordinator finishes.
struct BackgroundLink {
    coordinator: Coordinator,
}

#[async_trait]
impl RuntimeMessenger for BackgroundLink {
    async fn send_to_background(&self, message: ExtensionMessage) -> Result<(), SendError> {
        match message {
            ExtensionMessage::ToggleChanged { is_enabled } => {
                let coordinator = self.coordinator.clone();
                tokio::spawn(async move {
                    coordinator.on_toggle_message(is_enabled).await;
                });
                Ok(())
            }
            ExtensionMessage::StateUpdate { .. } => Err(SendError::NoReceivingEnd),
        }
    }
}

/// Wires the three components to in-process host services and routes host
/// events to their entry points.
pub struct ExtensionRuntime {
    target: TargetLocation,
    store: Arc<dyn StateStore>,
    tabs: Arc<TabRegistry>,
    hub: Arc<WatcherHub>,
    coordinator: Coordinator,
    emitter: Emitter,
    popup: Option<ToggleUi>,
}

impl ExtensionRuntime {
    pub fn new(
        store: Arc<dyn StateStore>,
        power: Arc<dyn PowerControl>,
        sound: Arc<dyn AlertSound>,
        emitter: Emitter,
    ) -> Self {
        let watcher_config = WatcherConfig::default();
        let target = watcher_config.target.clone();
        let tabs = Arc::new(TabRegistry::new(emitter.clone()));
        let hub = Arc::new(WatcherHub::new(watcher_config, sound, emitter.clone()));

        let coordinator = Coordinator::new(
            target.clone(),
            CoordinatorServices {
                store: store.clone(),
                tabs: tabs.clone(),
                messenger: hub.clone(),
                icon: Arc::new(EmittingIcon(emitter.clone())),
                power,
            },
        );

        Self {
            target,
            store,
            tabs,
            hub,
            coordinator,
            emitter,
            popup: None,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn hub(&self) -> &WatcherHub {
        &self.hub
    }

    /// Background process start.
    pub async fn start(&self) {
        self.coordinator.boot().await;
    }

    pub async fn dispatch(&mut self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::Installed => {
                self.coordinator.on_installed().await;
            }
            HostEvent::Startup => {
                self.coordinator.on_startup().await;
            }
            HostEvent::TabUpdated {
                tab_id,
                status,
                url,
            } => {
                self.tabs.update(tab_id, url.clone());
                self.coordinator
                    .on_tab_updated(tab_id, status, url.as_deref())
                    .await;
            }
            HostEvent::TabActivated { tab_id } => {
                self.tabs.activate(tab_id);
                self.coordinator.on_tab_activated(tab_id).await;
            }
            HostEvent::TabRemoved { tab_id } => {
                self.tabs.remove(tab_id);
                self.hub.unload(tab_id);
                let coordinator = self.coordinator.clone();
                tokio::spawn(async move {
                    coordinator.on_tab_removed(tab_id).await;
                });
            }
            HostEvent::PageLoaded { tab_id, hash } => {
                self.hub.load(tab_id, hash);
            }
            HostEvent::PageSnapshot { tab_id, elements } => {
                if !self.hub.snapshot(tab_id, elements) {
                    log_warn!("snapshot for tab {tab_id} without a loaded page");
                }
            }
            HostEvent::RouteChanged { tab_id, hash } => {
                if !self.hub.route_changed(tab_id, hash) {
                    log_warn!("route change for tab {tab_id} without a loaded page");
                }
            }
            HostEvent::PageUnloaded { tab_id } => {
                self.hub.unload(tab_id);
            }
            HostEvent::PopupOpened => {
                let mut popup = ToggleUi::new(
                    self.target.clone(),
                    PopupServices {
                        store: self.store.clone(),
                        tabs: self.tabs.clone(),
                        runtime: Arc::new(BackgroundLink {
                            coordinator: self.coordinator.clone(),
                        }),
                        view: Arc::new(EmittingPopupView(self.emitter.clone())),
                    },
                );
                popup.render().await?;
                self.popup = Some(popup);
            }
            HostEvent::PopupToggled { enabled } => {
                let popup = self
                    .popup
                    .as_mut()
                    .context("switch flipped while the popup is closed")?;
                popup.on_toggle_changed(enabled).await?;
            }
            HostEvent::PopupLinkClicked => {
                let popup = self
                    .popup
                    .take()
                    .context("link clicked while the popup is closed")?;
                popup.on_target_link().await?;
            }
        }
        Ok(())
    }

    /// Reads events until end of input. Bad lines and failed events are logged
    /// and skipped.
    pub async fn run_lines<R>(&mut self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("reading host events")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: HostEvent = match serde_json::from_str(line) {
                Ok(event) => event,
                Err(err) => {
                    log_warn!("ignoring malformed event {line:?}: {err}");
                    continue;
                }
            };
            if let Err(err) = self.dispatch(event).await {
                log_error!("event failed: {err:#}");
            }
        }
        log_info!("host event stream closed");
        Ok(())
    }
}
