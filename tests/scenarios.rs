//! End-to-end scenarios across coordinator, page watchers and popup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use orderbell_lib::config::{IconState, TargetLocation};
use orderbell_lib::coordinator::{Coordinator, CoordinatorServices, TabStatus, WakeLockState};
use orderbell_lib::host::{
    AlertSound, KeepAwakeLevel, PlaybackError, PowerControl, Tab, TabId, TabMessenger, TabQuery,
    ToolbarIcon,
};
use orderbell_lib::messages::{ExtensionMessage, SendError};
use orderbell_lib::runtime::{Emitter, ExtensionRuntime, HostOutput};
use orderbell_lib::settings::{self, MemoryStateStore};

// ============================================================================
// Test Helpers
// ============================================================================

const TARGET_URL: &str = "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder";

struct SingleTab(Tab);

#[async_trait]
impl TabQuery for SingleTab {
    async fn active_tab(&self) -> Option<Tab> {
        Some(self.0.clone())
    }

    async fn tabs_with_prefix(&self, prefix: &str) -> Vec<Tab> {
        match self.0.url.as_deref() {
            Some(url) if url.starts_with(prefix) => vec![self.0.clone()],
            _ => Vec::new(),
        }
    }

    async fn create_tab(&self, url: &str) -> anyhow::Result<Tab> {
        Ok(Tab {
            id: self.0.id + 1,
            url: Some(url.to_string()),
        })
    }
}

#[derive(Default)]
struct RecordingMessenger(Mutex<Vec<(TabId, ExtensionMessage)>>);

#[async_trait]
impl TabMessenger for RecordingMessenger {
    async fn send_to_tab(&self, tab_id: TabId, message: ExtensionMessage) -> Result<(), SendError> {
        self.0.lock().unwrap().push((tab_id, message));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingIcon(Mutex<Vec<IconState>>);

impl ToolbarIcon for RecordingIcon {
    fn set_icon(&self, state: IconState) {
        self.0.lock().unwrap().push(state);
    }
}

#[derive(Default)]
struct CountingPower {
    requests: AtomicUsize,
    releases: AtomicUsize,
}

impl PowerControl for CountingPower {
    fn request_keep_awake(&self, level: KeepAwakeLevel) -> anyhow::Result<()> {
        assert_eq!(level, KeepAwakeLevel::Display);
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release_keep_awake(&self) -> anyhow::Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct CountingSound(AtomicUsize);

impl AlertSound for CountingSound {
    fn play_from_start(&self) -> Result<(), PlaybackError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Background {
    coordinator: Coordinator,
    store: Arc<MemoryStateStore>,
    messenger: Arc<RecordingMessenger>,
    icon: Arc<RecordingIcon>,
    power: Arc<CountingPower>,
}

fn background(enabled: Option<bool>, active_url: &str) -> Background {
    let store = Arc::new(match enabled {
        Some(value) => MemoryStateStore::with_flag("isEnabled", value),
        None => MemoryStateStore::new(),
    });
    let messenger = Arc::new(RecordingMessenger::default());
    let icon = Arc::new(RecordingIcon::default());
    let power = Arc::new(CountingPower::default());
    let coordinator = Coordinator::new(
        TargetLocation::default(),
        CoordinatorServices {
            store: store.clone(),
            tabs: Arc::new(SingleTab(Tab {
                id: 1,
                url: Some(active_url.to_string()),
            })),
            messenger: messenger.clone(),
            icon: icon.clone(),
            power: power.clone(),
        },
    );
    Background {
        coordinator,
        store,
        messenger,
        icon,
        power,
    }
}

// ============================================================================
// Coordinator scenarios
// ============================================================================

#[tokio::test]
async fn disabled_on_target_stays_inactive_and_pushes_false() {
    let bg = background(Some(false), TARGET_URL);

    let outcome = bg
        .coordinator
        .on_tab_updated(1, TabStatus::Complete, Some(TARGET_URL))
        .await;

    assert!(outcome.is_some());
    assert_eq!(*bg.icon.0.lock().unwrap(), vec![IconState::Inactive]);
    assert_eq!(bg.power.requests.load(Ordering::SeqCst), 0);
    assert_eq!(bg.coordinator.wake_lock_state(), WakeLockState::Released);
    assert_eq!(
        *bg.messenger.0.lock().unwrap(),
        vec![(1, ExtensionMessage::StateUpdate { is_enabled: false })]
    );
}

#[tokio::test]
async fn query_suffix_on_target_route_activates() {
    let bg = background(
        Some(true),
        "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder?x=1",
    );

    let result = bg.coordinator.reconcile().await;

    assert_eq!(result.icon, IconState::Active);
    assert_eq!(result.wake_lock, WakeLockState::Display);
    assert_eq!(bg.power.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn longer_route_is_not_the_target() {
    let bg = background(
        Some(true),
        "https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrderExtra",
    );

    let result = bg.coordinator.reconcile().await;

    assert_eq!(result.icon, IconState::Inactive);
    assert_eq!(bg.power.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn startup_resets_persisted_flag() {
    let bg = background(Some(true), TARGET_URL);

    let result = bg.coordinator.on_startup().await;

    assert!(!settings::monitoring_enabled(bg.store.as_ref()).await.unwrap());
    assert_eq!(result.icon, IconState::Inactive);
    assert_eq!(result.wake_lock, WakeLockState::Released);
}

#[tokio::test]
async fn install_with_no_stored_flag_is_inactive() {
    let bg = background(None, TARGET_URL);
    let result = bg.coordinator.on_installed().await;
    assert_eq!(result.icon, IconState::Inactive);
}

#[tokio::test]
async fn switching_off_releases_within_one_pass() {
    let bg = background(Some(true), TARGET_URL);
    bg.coordinator.boot().await;
    assert_eq!(bg.coordinator.wake_lock_state(), WakeLockState::Display);

    settings::set_monitoring_enabled(bg.store.as_ref(), false)
        .await
        .unwrap();
    let outcomes = bg.coordinator.on_toggle_message(false).await;

    assert_eq!(bg.coordinator.wake_lock_state(), WakeLockState::Released);
    assert_eq!(bg.power.releases.load(Ordering::SeqCst), 1);
    assert_eq!(bg.icon.0.lock().unwrap().last(), Some(&IconState::Inactive));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        bg.messenger.0.lock().unwrap().last(),
        Some(&(1, ExtensionMessage::StateUpdate { is_enabled: false }))
    );
}

#[tokio::test]
async fn repeated_reconcile_requests_once() {
    let bg = background(Some(true), TARGET_URL);
    for _ in 0..5 {
        bg.coordinator.reconcile().await;
    }
    assert_eq!(bg.power.requests.load(Ordering::SeqCst), 1);
    assert_eq!(bg.power.releases.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Full runtime
// ============================================================================

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<HostOutput>) -> Vec<HostOutput> {
    let mut outputs = Vec::new();
    while let Ok(output) = rx.try_recv() {
        outputs.push(output);
    }
    outputs
}

#[tokio::test(start_paused = true)]
async fn switching_on_in_popup_alerts_on_marker() {
    let (emitter, mut rx) = Emitter::channel();
    let store = Arc::new(MemoryStateStore::with_flag("isEnabled", true));
    let power = Arc::new(CountingPower::default());
    let sound = Arc::new(CountingSound::default());
    let mut host = ExtensionRuntime::new(store.clone(), power.clone(), sound.clone(), emitter);

    let events = [
        r#"{"event":"startup"}"#,
        r#"{"event":"tabUpdated","tabId":1,"status":"complete","url":"https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder"}"#,
        r##"{"event":"pageLoaded","tabId":1,"hash":"#/subpages/tuidanOrder/tuidanOrder"}"##,
        r#"{"event":"tabActivated","tabId":1}"#,
        "this line is not json",
        r#"{"event":"popupOpened"}"#,
        r#"{"event":"popupToggled","enabled":true}"#,
        r#"{"event":"pageSnapshot","tabId":1,"elements":[{"selector":"uni-view","text":"订单详情"},{"selector":"uni-view","text":" 确认接单 "}]}"#,
    ]
    .join("\n");
    host.run_lines(events.as_bytes()).await.unwrap();

    let before = drain(&mut rx);
    assert!(before.contains(&HostOutput::PopupToggle { checked: false }));
    assert!(before.contains(&HostOutput::PopupStatus {
        text: "监测状态：已开启",
        color: "#28a745",
    }));

    // Let the broadcast land and the first polling tick fire.
    tokio::time::sleep(Duration::from_millis(5100)).await;

    assert!(settings::monitoring_enabled(store.as_ref()).await.unwrap());
    assert!(host.hub().is_polling(1));
    assert_eq!(host.coordinator().wake_lock_state(), WakeLockState::Display);
    assert_eq!(power.requests.load(Ordering::SeqCst), 1);
    assert_eq!(sound.0.load(Ordering::SeqCst), 1);

    let after = drain(&mut rx);
    assert!(after.iter().any(|output| matches!(
        output,
        HostOutput::IconChanged {
            state: IconState::Active,
            ..
        }
    )));
    assert!(after
        .iter()
        .any(|output| matches!(output, HostOutput::AlertPlayed { tab_id: 1, .. })));
}

#[tokio::test(start_paused = true)]
async fn closing_target_tab_releases_after_settle() {
    let (emitter, mut rx) = Emitter::channel();
    let store = Arc::new(MemoryStateStore::with_flag("isEnabled", true));
    let power = Arc::new(CountingPower::default());
    let mut host = ExtensionRuntime::new(
        store,
        power.clone(),
        Arc::new(CountingSound::default()),
        emitter,
    );

    let events = [
        r#"{"event":"tabUpdated","tabId":1,"status":"complete","url":"https://h5.feedov.com/#/subpages/tuidanOrder/tuidanOrder"}"#,
        r#"{"event":"tabActivated","tabId":1}"#,
        r#"{"event":"tabRemoved","tabId":1}"#,
    ]
    .join("\n");
    host.run_lines(events.as_bytes()).await.unwrap();
    assert_eq!(host.coordinator().wake_lock_state(), WakeLockState::Display);
    drain(&mut rx);

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(host.coordinator().wake_lock_state(), WakeLockState::Released);
    assert_eq!(power.releases.load(Ordering::SeqCst), 1);
    assert_eq!(
        drain(&mut rx),
        vec![HostOutput::IconChanged {
            state: IconState::Inactive,
            paths: IconState::Inactive.paths(),
        }]
    );
}

#[tokio::test]
async fn fallback_link_opens_target_in_new_tab() {
    let (emitter, mut rx) = Emitter::channel();
    let mut host = ExtensionRuntime::new(
        Arc::new(MemoryStateStore::new()),
        Arc::new(CountingPower::default()),
        Arc::new(CountingSound::default()),
        emitter,
    );

    let events = [
        r#"{"event":"tabUpdated","tabId":4,"status":"complete","url":"https://example.com/"}"#,
        r#"{"event":"tabActivated","tabId":4}"#,
        r#"{"event":"popupOpened"}"#,
        r#"{"event":"popupToggled","enabled":true}"#,
        r#"{"event":"popupLinkClicked"}"#,
    ]
    .join("\n");
    host.run_lines(events.as_bytes()).await.unwrap();

    let outputs: Vec<HostOutput> = drain(&mut rx)
        .into_iter()
        .filter(|output| !matches!(output, HostOutput::IconChanged { .. }))
        .collect();
    assert_eq!(
        outputs,
        vec![
            HostOutput::PopupFallback,
            HostOutput::TabCreated {
                tab_id: 5,
                url: TARGET_URL.into(),
            },
            HostOutput::PopupClosed,
        ]
    );
}
