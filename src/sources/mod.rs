mod catalog;
mod inventory;
mod live;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::record::ArtifactStatus;

pub use catalog::{human_readable_size, StaticCatalog};
pub use inventory::DirInventory;
pub use live::StateTable;

/// One artifact as advertised by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<String>,
}

/// Wire states reported by the acquisition engine. `Finalizing` is the
/// engine's post-transfer verification phase; canonically it is still a
/// download in progress. Entries that deserialize to `None` or `Unknown`
/// carry no authoritative information and leave the baseline in place.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LiveStatus {
    #[default]
    None,
    Downloading,
    Paused,
    Error,
    Downloaded,
    Removing,
    Finalizing,
    #[serde(other)]
    Unknown,
}

impl LiveStatus {
    /// Canonical status this wire state maps to, if any.
    #[must_use]
    pub fn canonical(self) -> Option<ArtifactStatus> {
        match self {
            LiveStatus::Downloading | LiveStatus::Finalizing => {
                Some(ArtifactStatus::Downloading)
            }
            LiveStatus::Paused => Some(ArtifactStatus::Paused),
            LiveStatus::Error => Some(ArtifactStatus::Error),
            LiveStatus::Downloaded => Some(ArtifactStatus::Downloaded),
            LiveStatus::Removing => Some(ArtifactStatus::Removing),
            LiveStatus::None | LiveStatus::Unknown => None,
        }
    }
}

/// Live per-artifact record pushed by the acquisition engine, keyed by
/// storage filename.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveState {
    pub status: LiveStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub resumable: bool,
}

/// Static list of known artifacts. Read-only and slow-changing.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>>;
}

/// Snapshot of which artifact files exist in local storage.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn list_local_files(&self) -> Result<Vec<String>>;
}

pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Mutable status table fed by the acquisition engine. Supports both a
/// pull snapshot and push change notification. Implementations must drop
/// the listener when its subscription is cancelled, so consumers can rely
/// on cancellation for teardown.
#[async_trait]
pub trait LiveStatusSource: Send + Sync {
    async fn states(&self) -> Result<HashMap<String, LiveState>>;

    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

/// Commands against the acquisition engine, addressed by storage
/// filename. `start` is start-or-resume; the engine owns partial-transfer
/// semantics. Outcomes are reflected asynchronously in the live status
/// source.
#[async_trait]
pub trait AcquisitionEngine: Send + Sync {
    async fn start(&self, storage_name: &str) -> Result<()>;

    async fn pause(&self, storage_name: &str) -> Result<()>;

    async fn delete(&self, storage_name: &str) -> Result<()>;
}

/// Handle for an active push subscription. Cancelling is idempotent and
/// dropping the handle cancels.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
