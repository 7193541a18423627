use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::host::{Tab, TabId, TabQuery};

use super::events::{Emitter, HostOutput};

#[derive(Default)]
struct Tabs {
    urls: BTreeMap<TabId, Option<String>>,
    active: Option<TabId>,
}

/// Mirror of the browser's tabs, kept current from tab events.
pub struct TabRegistry {
    state: Mutex<Tabs>,
    emitter: Emitter,
}

impl TabRegistry {
    pub fn new(emitter: Emitter) -> Self {
        Self {
            state: Mutex::new(Tabs::default()),
            emitter,
        }
    }

    pub fn update(&self, tab_id: TabId, url: Option<String>) {
        let mut tabs = self.lock();
        let entry = tabs.urls.entry(tab_id).or_default();
        // Loading updates often omit the URL; keep the last known one.
        if url.is_some() {
            *entry = url;
        }
    }

    pub fn activate(&self, tab_id: TabId) {
        let mut tabs = self.lock();
        tabs.urls.entry(tab_id).or_default();
        tabs.active = Some(tab_id);
    }

    pub fn remove(&self, tab_id: TabId) {
        let mut tabs = self.lock();
        tabs.urls.remove(&tab_id);
        if tabs.active == Some(tab_id) {
            tabs.active = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tabs> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl TabQuery for TabRegistry {
    async fn active_tab(&self) -> Option<Tab> {
        let tabs = self.lock();
        let id = tabs.active?;
        Some(Tab {
            id,
            url: tabs.urls.get(&id).cloned().flatten(),
        })
    }

    async fn tabs_with_prefix(&self, prefix: &str) -> Vec<Tab> {
        self.lock()
            .urls
            .iter()
            .filter_map(|(id, url)| {
                let url = url.as_deref()?;
                url.starts_with(prefix).then(|| Tab {
                    id: *id,
                    url: Some(url.to_string()),
                })
            })
            .collect()
    }

    async fn create_tab(&self, url: &str) -> Result<Tab> {
        let id = {
            let mut tabs = self.lock();
            let id = match tabs.urls.keys().next_back() {
                Some(last) => last
                    .checked_add(1)
                    .with_context(|| format!("no tab id left after {last}"))?,
                None => 1,
            };
            tabs.urls.insert(id, Some(url.to_string()));
            tabs.active = Some(id);
            id
        };
        self.emitter.emit(HostOutput::TabCreated {
            tab_id: id,
            url: url.to_string(),
        });
        Ok(Tab {
            id,
            url: Some(url.to_string()),
        })
    }
}
