use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    config::{IconState, TargetLocation, TAB_REMOVAL_SETTLE},
    host::{KeepAwakeLevel, PowerControl, TabId, TabMessenger, TabQuery, ToolbarIcon},
    messages::{DeliveryOutcome, ExtensionMessage},
    settings::{self, StateStore},
};

use super::wake_lock::{WakeLock, WakeLockState};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[coordinator]";

use crate::{log_debug, log_error, log_info, log_warn};

/// Host services the background coordinator consumes.
pub struct CoordinatorServices {
    pub store: Arc<dyn StateStore>,
    pub tabs: Arc<dyn TabQuery>,
    pub messenger: Arc<dyn TabMessenger>,
    pub icon: Arc<dyn ToolbarIcon>,
    pub power: Arc<dyn PowerControl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Icon and wake-lock state left behind by one `reconcile` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub icon: IconState,
    pub wake_lock: WakeLockState,
}

/// Background component: derives icon and wake-lock from the monitoring flag and
/// the active tab, and relays the flag to page watchers.
#[derive(Clone)]
pub struct Coordinator {
    target: Arc<TargetLocation>,
    store: Arc<dyn StateStore>,
    tabs: Arc<dyn TabQuery>,
    messenger: Arc<dyn TabMessenger>,
    icon: Arc<dyn ToolbarIcon>,
    wake_lock: Arc<WakeLock>,
    removal_settle: Duration,
}

impl Coordinator {
    pub fn new(target: TargetLocation, services: CoordinatorServices) -> Self {
        Self {
            target: Arc::new(target),
            store: services.store,
            tabs: services.tabs,
            messenger: services.messenger,
            icon: services.icon,
            wake_lock: Arc::new(WakeLock::new(services.power)),
            removal_settle: TAB_REMOVAL_SETTLE,
        }
    }

    pub fn wake_lock_state(&self) -> WakeLockState {
        self.wake_lock.state()
    }

    /// Recomputes icon and wake-lock from the current flag and active tab.
    pub async fn reconcile(&self) -> Reconciliation {
        let enabled = self.read_flag().await;
        let active_url = self.tabs.active_tab().await.and_then(|tab| tab.url);

        let on_target = match active_url {
            Some(url) if enabled => self.target.is_target_page(&url),
            _ => false,
        };

        let icon = IconState::from_active(on_target);
        self.icon.set_icon(icon);
        if on_target {
            self.wake_lock.request(KeepAwakeLevel::Display);
        } else {
            self.wake_lock.release();
        }

        log_debug!("reconciled: enabled={enabled} on_target={on_target}");
        Reconciliation {
            icon,
            wake_lock: self.wake_lock.state(),
        }
    }

    /// First pass when the background process comes up.
    pub async fn boot(&self) -> Reconciliation {
        self.reconcile().await
    }

    pub async fn on_installed(&self) -> Reconciliation {
        self.reconcile().await
    }

    /// Browser startup: monitoring always starts switched off.
    pub async fn on_startup(&self) -> Reconciliation {
        if let Err(err) = settings::set_monitoring_enabled(self.store.as_ref(), false).await {
            log_error!("failed to reset monitoring flag on startup: {err:#}");
        }
        let outcome = self.reconcile().await;
        log_info!("browser started; monitoring reset to off until switched on");
        outcome
    }

    /// The popup flipped the switch: reconcile, then push the new value to every
    /// tab on the target site.
    pub async fn on_toggle_message(&self, enabled: bool) -> Vec<(TabId, DeliveryOutcome)> {
        log_info!("monitoring set to {}", if enabled { "on" } else { "off" });
        self.reconcile().await;

        let tabs = self.tabs.tabs_with_prefix(&self.target.site_prefix).await;
        let mut outcomes = Vec::with_capacity(tabs.len());
        for tab in tabs {
            let outcome = self.push_state(tab.id, enabled).await;
            outcomes.push((tab.id, outcome));
        }
        outcomes
    }

    /// A tab changed. Only finished loads are acted upon.
    pub async fn on_tab_updated(
        &self,
        tab_id: TabId,
        status: TabStatus,
        url: Option<&str>,
    ) -> Option<DeliveryOutcome> {
        if status != TabStatus::Complete {
            return None;
        }
        self.reconcile().await;

        let url = url.filter(|url| self.target.is_on_site(url))?;
        log_debug!("tab {tab_id} finished loading {url}");
        let enabled = self.read_flag().await;
        Some(self.push_state(tab_id, enabled).await)
    }

    /// Focus moved to another tab. The event's tab is not trusted; the active tab
    /// is queried again after reconciling.
    pub async fn on_tab_activated(&self, tab_id: TabId) -> Option<DeliveryOutcome> {
        log_debug!("tab {tab_id} activated");
        self.reconcile().await;

        let tab = self.tabs.active_tab().await?;
        let on_site = tab
            .url
            .as_deref()
            .is_some_and(|url| self.target.is_on_site(url));
        if !on_site {
            return None;
        }
        let enabled = self.read_flag().await;
        Some(self.push_state(tab.id, enabled).await)
    }

    /// A tab closed. The new active tab is not known yet, so wait briefly first.
    pub async fn on_tab_removed(&self, tab_id: TabId) -> Reconciliation {
        log_debug!("tab {tab_id} removed");
        tokio::time::sleep(self.removal_settle).await;
        self.reconcile().await
    }

    async fn push_state(&self, tab_id: TabId, enabled: bool) -> DeliveryOutcome {
        let message = ExtensionMessage::StateUpdate {
            is_enabled: enabled,
        };
        let outcome = DeliveryOutcome::from(self.messenger.send_to_tab(tab_id, message).await);
        match &outcome {
            DeliveryOutcome::Delivered => log_debug!("tab {tab_id} <- enabled={enabled}"),
            DeliveryOutcome::NoEndpoint => {}
            DeliveryOutcome::Failed(reason) => {
                log_error!("failed to notify tab {tab_id}: {reason}")
            }
        }
        outcome
    }

    async fn read_flag(&self) -> bool {
        match settings::monitoring_enabled(self.store.as_ref()).await {
            Ok(enabled) => enabled,
            Err(err) => {
                log_warn!("monitoring flag unreadable, treating as off: {err:#}");
                false
            }
        }
    }
}
