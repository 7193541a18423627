use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    config::WatcherConfig,
    host::{AlertSound, PageDocument},
    messages::ExtensionMessage,
};

use super::{
    alert::{AlertAttempt, AlertGate},
    session::PollingSession,
};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "[watcher]";

use crate::{log_debug, log_info};

/// Result of one marker scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Monitoring is off or the route moved away since the timer was armed.
    Skipped,
    NotFound,
    Detected(AlertAttempt),
}

/// State shared between the watcher and its timer task.
pub(crate) struct WatcherCore {
    config: WatcherConfig,
    document: Arc<dyn PageDocument>,
    enabled: AtomicBool,
    alert: AlertGate,
}

impl WatcherCore {
    fn should_poll(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
            && self
                .config
                .target
                .matches_route(&self.document.location_hash())
    }

    pub(crate) fn check_for_marker(&self) -> ScanOutcome {
        // A cancelled timer may still deliver one last tick.
        if !self.should_poll() {
            return ScanOutcome::Skipped;
        }

        let marker = self.config.marker_text.as_str();
        let found = self
            .document
            .text_contents(&self.config.selector)
            .iter()
            .any(|text| text.trim() == marker);

        if !found {
            return ScanOutcome::NotFound;
        }
        log_info!("order confirmation button detected");
        ScanOutcome::Detected(self.alert.play())
    }
}

/// Per-page marker watcher.
///
/// The enabled flag only ever arrives through `state-update` messages; the
/// watcher never reads the state store itself.
pub struct PageWatcher {
    core: Arc<WatcherCore>,
    session: Option<PollingSession>,
}

impl PageWatcher {
    pub fn new(
        config: WatcherConfig,
        document: Arc<dyn PageDocument>,
        sound: Arc<dyn AlertSound>,
    ) -> Self {
        let alert = AlertGate::new(sound, config.debounce_window);
        Self {
            core: Arc::new(WatcherCore {
                config,
                document,
                enabled: AtomicBool::new(false),
                alert,
            }),
            session: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.core.enabled.load(Ordering::SeqCst)
    }

    pub fn is_polling(&self) -> bool {
        self.session.is_some()
    }

    /// Entry point for runtime messages addressed to this page. Returns whether
    /// the message was understood.
    pub fn on_message(&mut self, message: ExtensionMessage) -> bool {
        match message {
            ExtensionMessage::StateUpdate { is_enabled } => {
                self.on_state_update(is_enabled);
                true
            }
            ExtensionMessage::ToggleChanged { .. } => false,
        }
    }

    pub fn on_state_update(&mut self, enabled: bool) {
        self.core.enabled.store(enabled, Ordering::SeqCst);
        log_info!(
            "monitoring status update: {}",
            if enabled { "on" } else { "off" }
        );
        self.refresh_session();
    }

    /// The single-page app switched routes without a reload.
    pub fn on_route_change(&mut self) {
        log_debug!("route changed to {}", self.core.document.location_hash());
        self.refresh_session();
    }

    /// Page is going away: stop polling regardless of the gate.
    pub fn on_unload(&mut self) {
        self.stop();
    }

    pub fn check_for_marker(&self) -> ScanOutcome {
        self.core.check_for_marker()
    }

    pub fn play_alert(&self) -> AlertAttempt {
        self.core.alert.play()
    }

    fn refresh_session(&mut self) {
        if self.core.should_poll() {
            self.start();
        } else {
            self.stop();
        }
    }

    fn start(&mut self) {
        if self.session.is_some() {
            return;
        }
        self.session = Some(PollingSession::start(
            self.core.clone(),
            self.core.config.polling_interval,
        ));
        log_info!("monitoring started");
    }

    fn stop(&mut self) {
        if self.session.take().is_some() {
            log_info!("monitoring stopped");
        }
    }
}
