use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::{
    config::TargetLocation,
    host::{PopupView, RuntimeMessenger, Tab, TabQuery},
    messages::ExtensionMessage,
    settings::{self, StateStore},
};

use super::status::StatusLabel;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[popup]";

use crate::{log_info, log_warn};

pub struct PopupServices {
    pub store: Arc<dyn StateStore>,
    pub tabs: Arc<dyn TabQuery>,
    pub runtime: Arc<dyn RuntimeMessenger>,
    pub view: Arc<dyn PopupView>,
}

/// Which area the popup shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupMode {
    Toggle { enabled: bool },
    Fallback,
}

/// The toolbar popup. Lives only while open; the active tab is evaluated once,
/// at render time.
pub struct ToggleUi {
    target: TargetLocation,
    store: Arc<dyn StateStore>,
    tabs: Arc<dyn TabQuery>,
    runtime: Arc<dyn RuntimeMessenger>,
    view: Arc<dyn PopupView>,
    mode: Option<PopupMode>,
}

impl ToggleUi {
    pub fn new(target: TargetLocation, services: PopupServices) -> Self {
        Self {
            target,
            store: services.store,
            tabs: services.tabs,
            runtime: services.runtime,
            view: services.view,
            mode: None,
        }
    }

    pub fn mode(&self) -> Option<PopupMode> {
        self.mode
    }

    pub async fn render(&mut self) -> Result<PopupMode> {
        let active_url = self.tabs.active_tab().await.and_then(|tab| tab.url);
        let on_target = active_url
            .as_deref()
            .is_some_and(|url| self.target.is_exact_page(url));

        let mode = if on_target {
            let enabled = settings::monitoring_enabled(self.store.as_ref())
                .await
                .context("reading monitoring flag for popup")?;
            self.view.show_toggle(enabled);
            self.view.set_status(StatusLabel::for_enabled(enabled));
            PopupMode::Toggle { enabled }
        } else {
            self.view.show_fallback();
            PopupMode::Fallback
        };

        self.mode = Some(mode);
        Ok(mode)
    }

    /// The user flipped the switch. Returns once the coordinator is notified; page
    /// watchers are not waited for.
    pub async fn on_toggle_changed(&mut self, enabled: bool) -> Result<()> {
        if !matches!(self.mode, Some(PopupMode::Toggle { .. })) {
            bail!("monitoring switch is only available on the target page");
        }

        settings::set_monitoring_enabled(self.store.as_ref(), enabled)
            .await
            .context("saving monitoring flag")?;
        self.mode = Some(PopupMode::Toggle { enabled });
        self.view.set_status(StatusLabel::for_enabled(enabled));

        let message = ExtensionMessage::ToggleChanged {
            is_enabled: enabled,
        };
        if let Err(err) = self.runtime.send_to_background(message).await {
            log_warn!("background did not receive toggle: {err}");
        }
        log_info!("monitoring switched {}", if enabled { "on" } else { "off" });
        Ok(())
    }

    /// Fallback link: open the target page in a new tab, then close the popup.
    pub async fn on_target_link(&self) -> Result<Tab> {
        let tab = self
            .tabs
            .create_tab(&self.target.full_url)
            .await
            .with_context(|| format!("opening {}", self.target.full_url))?;
        self.view.close();
        Ok(tab)
    }
}
