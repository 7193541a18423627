use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    config::WatcherConfig,
    host::{AlertSound, PageDocument, PlaybackError, TabId, TabMessenger},
    messages::{ExtensionMessage, SendError},
    watcher::PageWatcher,
};

use super::events::{Emitter, HostOutput, PageElement};

/// Last known state of a page, as reported by snapshot events.
#[derive(Default)]
pub struct SnapshotDocument {
    state: Mutex<(String, Vec<PageElement>)>,
}

impl SnapshotDocument {
    pub fn new(hash: String) -> Self {
        Self {
            state: Mutex::new((hash, Vec::new())),
        }
    }

    pub fn set_hash(&self, hash: String) {
        self.lock().0 = hash;
    }

    pub fn set_elements(&self, elements: Vec<PageElement>) {
        self.lock().1 = elements;
    }

    fn lock(&self) -> MutexGuard<'_, (String, Vec<PageElement>)> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl PageDocument for SnapshotDocument {
    fn location_hash(&self) -> String {
        self.lock().0.clone()
    }

    fn text_contents(&self, selector: &str) -> Vec<String> {
        self.lock()
            .1
            .iter()
            .filter(|element| element.selector == selector)
            .map(|element| element.text.clone())
            .collect()
    }
}

/// Reports each alert that actually started.
struct ReportingSound {
    tab_id: TabId,
    inner: Arc<dyn AlertSound>,
    emitter: Emitter,
}

impl AlertSound for ReportingSound {
    fn play_from_start(&self) -> Result<(), PlaybackError> {
        self.inner.play_from_start()?;
        self.emitter.emit(HostOutput::AlertPlayed {
            tab_id: self.tab_id,
            at: Utc::now(),
        });
        Ok(())
    }
}

struct HostedPage {
    watcher: PageWatcher,
    document: Arc<SnapshotDocument>,
}

/// Page watchers of every loaded target-site page, keyed by tab.
pub struct WatcherHub {
    config: WatcherConfig,
    sound: Arc<dyn AlertSound>,
    emitter: Emitter,
    pages: Mutex<HashMap<TabId, HostedPage>>,
}

impl WatcherHub {
    pub fn new(config: WatcherConfig, sound: Arc<dyn AlertSound>, emitter: Emitter) -> Self {
        Self {
            config,
            sound,
            emitter,
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Injects a fresh watcher. A reload replaces the old one, which stops its timer.
    pub fn load(&self, tab_id: TabId, hash: String) {
        let document = Arc::new(SnapshotDocument::new(hash));
        let sound = Arc::new(ReportingSound {
            tab_id,
            inner: self.sound.clone(),
            emitter: self.emitter.clone(),
        });
        let watcher = PageWatcher::new(self.config.clone(), document.clone(), sound);
        if let Some(mut previous) = self
            .lock()
            .insert(tab_id, HostedPage { watcher, document })
        {
            previous.watcher.on_unload();
        }
    }

    pub fn snapshot(&self, tab_id: TabId, elements: Vec<PageElement>) -> bool {
        match self.lock().get(&tab_id) {
            Some(page) => {
                page.document.set_elements(elements);
                true
            }
            None => false,
        }
    }

    pub fn route_changed(&self, tab_id: TabId, hash: String) -> bool {
        match self.lock().get_mut(&tab_id) {
            Some(page) => {
                page.document.set_hash(hash);
                page.watcher.on_route_change();
                true
            }
            None => false,
        }
    }

    pub fn unload(&self, tab_id: TabId) {
        if let Some(mut page) = self.lock().remove(&tab_id) {
            page.watcher.on_unload();
        }
    }

    pub fn is_polling(&self, tab_id: TabId) -> bool {
        self.lock()
            .get(&tab_id)
            .is_some_and(|page| page.watcher.is_polling())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TabId, HostedPage>> {
        match self.pages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl TabMessenger for WatcherHub {
    async fn send_to_tab(&self, tab_id: TabId, message: ExtensionMessage) -> Result<(), SendError> {
        let mut pages = self.lock();
        let page = pages.get_mut(&tab_id).ok_or(SendError::NoReceivingEnd)?;
        if page.watcher.on_message(message) {
            Ok(())
        } else {
            Err(SendError::Other(format!(
                "tab {tab_id} has no handler for {message:?}"
            )))
        }
    }
}
