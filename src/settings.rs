use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::{Mutex, RwLock},
};

use crate::config::MONITORING_KEY;

/// Durable key→value storage shared by every component.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>>;
    async fn set_flag(&self, key: &str, value: bool) -> Result<()>;
}

/// Reads the monitoring switch. Unset means off.
pub async fn monitoring_enabled(store: &dyn StateStore) -> Result<bool> {
    Ok(store.get_flag(MONITORING_KEY).await?.unwrap_or(false))
}

pub async fn set_monitoring_enabled(store: &dyn StateStore, enabled: bool) -> Result<()> {
    store.set_flag(MONITORING_KEY, enabled).await
}

type StoredValues = BTreeMap<String, Value>;

/// JSON file backed store. Every write rewrites the whole file.
pub struct JsonStateStore {
    path: PathBuf,
    data: RwLock<StoredValues>,
}

impl JsonStateStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "State file {} is not valid JSON ({err}); starting from defaults",
                    path.display()
                );
                StoredValues::default()
            })
        } else {
            StoredValues::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &StoredValues) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write state to {}", self.path.display()))
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        let guard = match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(guard.get(key).and_then(Value::as_bool))
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut updated = guard.clone();
        updated.insert(key.to_string(), Value::Bool(value));
        // Memory only follows the file once the write went through.
        self.persist(&updated)?;
        *guard = updated;
        Ok(())
    }
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStateStore {
    data: Mutex<BTreeMap<String, bool>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(key: &str, value: bool) -> Self {
        let store = Self::default();
        store.lock().insert(key.to_string(), value);
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, bool>> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.lock().get(key).copied())
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.lock().insert(key.to_string(), value);
        Ok(())
    }
}
