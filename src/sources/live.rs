use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use parking_lot::Mutex;

use super::{ChangeListener, LiveState, LiveStatus, LiveStatusSource, Subscription};

const STATES_FILE: &str = "model_states.json";

/// Live status table the acquisition engine writes into, keyed by storage
/// filename. Every write notifies subscribers and, when a backing file is
/// configured, persists the table as JSON.
///
/// A table loaded from disk demotes `downloading` entries to `paused`
/// (resumable): if the process died mid-transfer, the partial state on
/// disk is still resumable but nothing is actively downloading.
pub struct StateTable {
    path: Option<PathBuf>,
    states: Mutex<HashMap<String, LiveState>>,
    listeners: Arc<Mutex<HashMap<u64, ChangeListener>>>,
    next_listener: AtomicU64,
}

impl StateTable {
    /// Table without persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            states: Mutex::new(HashMap::new()),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Table backed by a JSON file; loads existing state if present.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let states = load_states(&path)?;
        Ok(Self {
            path: Some(path),
            states: Mutex::new(states),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: AtomicU64::new(0),
        })
    }

    /// Persistent table under the per-user models directory.
    pub fn at_default_path() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "PushToTalk", "PushToTalk")
            .context("missing project directories")?;
        let dir = project_dirs.data_dir().join("models");
        fs::create_dir_all(&dir).context("create models dir")?;
        Self::load(dir.join(STATES_FILE))
    }

    /// Replaces the entry for `storage_name`, persists, and notifies.
    pub fn update(&self, storage_name: &str, state: LiveState) {
        {
            let mut states = self.states.lock();
            states.insert(storage_name.to_string(), state);
            self.persist(&states);
        }
        self.notify();
    }

    /// Mutates the entry for `storage_name` in place (inserting a default
    /// entry if absent), persists, and notifies.
    pub fn patch(&self, storage_name: &str, apply: impl FnOnce(&mut LiveState)) {
        {
            let mut states = self.states.lock();
            let state = states.entry(storage_name.to_string()).or_default();
            apply(state);
            self.persist(&states);
        }
        self.notify();
    }

    /// Drops the entry for `storage_name`, persists, and notifies.
    pub fn clear(&self, storage_name: &str) {
        let removed = {
            let mut states = self.states.lock();
            let removed = states.remove(storage_name).is_some();
            if removed {
                self.persist(&states);
            }
            removed
        };
        if removed {
            self.notify();
        }
    }

    #[must_use]
    pub fn get(&self, storage_name: &str) -> Option<LiveState> {
        self.states.lock().get(storage_name).cloned()
    }

    fn persist(&self, states: &HashMap<String, LiveState>) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if let Err(error) = persist_states(path, states) {
            tracing::warn!("failed to persist live state table: {error:#}");
        }
    }

    fn notify(&self) {
        let listeners: Vec<ChangeListener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }
}

#[async_trait]
impl LiveStatusSource for StateTable {
    async fn states(&self) -> Result<HashMap<String, LiveState>> {
        Ok(self.states.lock().clone())
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, listener);
        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            listeners.lock().remove(&id);
        })
    }
}

fn load_states(path: &Path) -> Result<HashMap<String, LiveState>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read live state table {}", path.display()))?;
    let mut states: HashMap<String, LiveState> =
        serde_json::from_str(&raw).context("parse live state table")?;
    for state in states.values_mut() {
        if state.status == LiveStatus::Downloading {
            state.status = LiveStatus::Paused;
            state.resumable = true;
        }
    }
    Ok(states)
}

fn persist_states(path: &Path, states: &HashMap<String, LiveState>) -> Result<()> {
    let json = serde_json::to_string_pretty(states).context("encode live state table")?;
    fs::write(path, json).with_context(|| format!("write live state table {}", path.display()))
}
