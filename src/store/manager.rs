use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{ActionError, FetchError};
use crate::naming::StorageNaming;
use crate::record::{ArtifactRecord, ArtifactStatus};
use crate::sources::{AcquisitionEngine, CatalogSource, InventorySource, LiveStatusSource};

use super::{filter, reconcile};

/// Single owner of the canonical artifact list.
///
/// Reconciliation merges the catalog, inventory, and live status sources
/// into one ordered snapshot; user actions apply optimistic patches and
/// issue engine commands. Both mutation paths go through the internal
/// watch channel, and a semantically unchanged snapshot is never
/// re-published.
pub struct ArtifactStore {
    catalog: Arc<dyn CatalogSource>,
    inventory: Arc<dyn InventorySource>,
    live: Arc<dyn LiveStatusSource>,
    engine: Arc<dyn AcquisitionEngine>,
    naming: StorageNaming,
    canonical: watch::Sender<Vec<ArtifactRecord>>,
    reconciling: AtomicBool,
    rerun: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        inventory: Arc<dyn InventorySource>,
        live: Arc<dyn LiveStatusSource>,
        engine: Arc<dyn AcquisitionEngine>,
    ) -> Self {
        Self::with_naming(catalog, inventory, live, engine, StorageNaming::default())
    }

    #[must_use]
    pub fn with_naming(
        catalog: Arc<dyn CatalogSource>,
        inventory: Arc<dyn InventorySource>,
        live: Arc<dyn LiveStatusSource>,
        engine: Arc<dyn AcquisitionEngine>,
        naming: StorageNaming,
    ) -> Self {
        let (canonical, _) = watch::channel(Vec::new());
        Self {
            catalog,
            inventory,
            live,
            engine,
            naming,
            canonical,
            reconciling: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Current canonical list.
    #[must_use]
    pub fn artifacts(&self) -> Vec<ArtifactRecord> {
        self.canonical.borrow().clone()
    }

    /// Receiver that observes published snapshots.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Vec<ArtifactRecord>> {
        self.canonical.subscribe()
    }

    #[must_use]
    pub fn is_reconciling(&self) -> bool {
        self.reconciling.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    #[must_use]
    pub fn naming(&self) -> &StorageNaming {
        &self.naming
    }

    pub(crate) fn live_source(&self) -> Arc<dyn LiveStatusSource> {
        Arc::clone(&self.live)
    }

    /// Runs one reconciliation cycle. Cycles never overlap: a call while
    /// one is in flight requests a follow-up cycle and returns
    /// immediately, since the running cycle's successor will read fresh
    /// snapshots anyway.
    ///
    /// The trigger is recorded before the busy probe, and the holder
    /// re-checks pending triggers after releasing the flag, so a trigger
    /// that lands while a cycle is finishing still gets its follow-up.
    /// The flag is held through an RAII guard: a caller whose future is
    /// dropped mid-cycle releases it instead of wedging the store.
    pub async fn reconcile(&self) -> Result<(), FetchError> {
        self.rerun.store(true, Ordering::SeqCst);
        let Some(mut busy) = CycleGuard::try_acquire(&self.reconciling) else {
            return Ok(());
        };
        let mut result = Ok(());
        loop {
            while self.rerun.swap(false, Ordering::SeqCst) {
                result = self.run_cycle().await;
            }
            drop(busy);
            if self.rerun.load(Ordering::SeqCst) {
                match CycleGuard::try_acquire(&self.reconciling) {
                    Some(reacquired) => {
                        busy = reacquired;
                        continue;
                    }
                    // Another caller owns the flag now; its cycle loop
                    // will consume the pending trigger.
                    None => break,
                }
            }
            break;
        }
        result
    }

    /// Starts or resumes a download. A no-op while the artifact is
    /// already downloading, which keeps duplicate triggers from issuing a
    /// second engine start.
    pub async fn download(&self, key: &str) -> Result<(), ActionError> {
        if !self.begin_download(key)? {
            tracing::debug!(%key, "download already in flight");
            return Ok(());
        }

        let storage_name = self.naming.storage_name(key);
        if let Err(error) = self.engine.start(&storage_name).await {
            let message = format!("{error:#}");
            tracing::warn!(%key, "engine start failed: {message}");
            let text = message.clone();
            self.patch(key, move |record| {
                record.status = ArtifactStatus::Error;
                record.error_message = Some(text);
            });
            return Err(ActionError::Engine {
                command: "start",
                key: key.to_string(),
                message,
            });
        }

        self.reconcile_after_action().await;
        Ok(())
    }

    /// Pauses an in-flight download. No optimistic patch here: pause can
    /// race with completion, so the engine's authoritative status decides.
    pub async fn pause(&self, key: &str) -> Result<(), ActionError> {
        let record = self.find(key).ok_or_else(|| ActionError::UnknownArtifact {
            key: key.to_string(),
        })?;
        if record.status != ArtifactStatus::Downloading {
            return Err(ActionError::InvalidTransition {
                key: key.to_string(),
                status: record.status,
                action: "pause",
            });
        }

        let storage_name = self.naming.storage_name(key);
        if let Err(error) = self.engine.pause(&storage_name).await {
            let message = format!("{error:#}");
            tracing::warn!(%key, "engine pause failed: {message}");
            let text = message.clone();
            self.patch(key, move |record| {
                record.status = ArtifactStatus::Error;
                record.error_message = Some(text);
            });
            return Err(ActionError::Engine {
                command: "pause",
                key: key.to_string(),
                message,
            });
        }

        self.reconcile_after_action().await;
        Ok(())
    }

    /// Retries a failed download. Same path as `download`; the engine
    /// resumes from partial state where it can.
    pub async fn retry(&self, key: &str) -> Result<(), ActionError> {
        self.download(key).await
    }

    /// Removes a downloaded, paused, or failed artifact. On engine
    /// failure the record reverts to exactly its prior state and the
    /// error is surfaced through the return value and `last_error`.
    pub async fn remove(&self, key: &str) -> Result<(), ActionError> {
        let prior = self.begin_remove(key)?;

        let storage_name = self.naming.storage_name(key);
        if let Err(error) = self.engine.delete(&storage_name).await {
            let message = format!("{error:#}");
            tracing::warn!(%key, "engine delete failed: {message}");
            self.restore(prior);
            *self.last_error.lock() = Some(message.clone());
            return Err(ActionError::Engine {
                command: "delete",
                key: key.to_string(),
                message,
            });
        }

        self.patch(key, |record| {
            record.status = ArtifactStatus::NotDownloaded;
            record.resumable = false;
        });
        self.reconcile_after_action().await;
        Ok(())
    }

    /// Precondition checks and the optimistic patch run inside one
    /// watch-channel critical section, so two racing calls cannot both
    /// pass the in-flight check. Returns `Ok(false)` when the artifact is
    /// already downloading and nothing was dispatched.
    fn begin_download(&self, key: &str) -> Result<bool, ActionError> {
        let mut outcome = Err(ActionError::UnknownArtifact {
            key: key.to_string(),
        });
        self.canonical.send_if_modified(|records| {
            let Some(record) = records.iter_mut().find(|record| record.key == key) else {
                return false;
            };
            if record.status == ArtifactStatus::Downloading {
                outcome = Ok(false);
                return false;
            }
            if record.source_url.is_none() {
                outcome = Err(ActionError::NotInCatalog {
                    key: key.to_string(),
                });
                return false;
            }
            record.status = ArtifactStatus::Downloading;
            record.progress = Some(0);
            record.normalize();
            outcome = Ok(true);
            true
        });
        outcome
    }

    /// Same guarded transition for removal. Returns the record as it was
    /// before the `Removing` patch, for revert on engine failure.
    fn begin_remove(&self, key: &str) -> Result<ArtifactRecord, ActionError> {
        let mut outcome = Err(ActionError::UnknownArtifact {
            key: key.to_string(),
        });
        self.canonical.send_if_modified(|records| {
            let Some(record) = records.iter_mut().find(|record| record.key == key) else {
                return false;
            };
            if !matches!(
                record.status,
                ArtifactStatus::Downloaded | ArtifactStatus::Paused | ArtifactStatus::Error
            ) {
                outcome = Err(ActionError::InvalidTransition {
                    key: key.to_string(),
                    status: record.status,
                    action: "remove",
                });
                return false;
            }
            let prior = record.clone();
            record.status = ArtifactStatus::Removing;
            record.normalize();
            outcome = Ok(prior);
            true
        });
        outcome
    }

    async fn run_cycle(&self) -> Result<(), FetchError> {
        let fetched = tokio::try_join!(
            async {
                self.catalog
                    .list_catalog()
                    .await
                    .map_err(FetchError::Catalog)
            },
            async {
                self.inventory
                    .list_local_files()
                    .await
                    .map_err(FetchError::Inventory)
            },
            async { self.live.states().await.map_err(FetchError::LiveStatus) },
        );
        match fetched {
            Ok((catalog, inventory, live)) => {
                let next = reconcile::merge(&self.naming, &catalog, &inventory, &live);
                self.publish(next);
                *self.last_error.lock() = None;
                Ok(())
            }
            Err(error) => {
                // Previous canonical list stays published: stale but valid.
                tracing::warn!("reconciliation failed: {error}");
                *self.last_error.lock() = Some(error.to_string());
                Err(error)
            }
        }
    }

    async fn reconcile_after_action(&self) {
        if let Err(error) = self.reconcile().await {
            tracing::warn!("post-action reconciliation failed: {error}");
        }
    }

    fn publish(&self, next: Vec<ArtifactRecord>) {
        self.canonical.send_if_modified(|current| {
            if filter::snapshots_equal(current, &next) {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn patch(&self, key: &str, apply: impl FnOnce(&mut ArtifactRecord)) {
        self.canonical.send_if_modified(|records| {
            let Some(record) = records.iter_mut().find(|record| record.key == key) else {
                return false;
            };
            apply(record);
            record.normalize();
            true
        });
    }

    fn restore(&self, prior: ArtifactRecord) {
        self.canonical.send_if_modified(|records| {
            match records.iter_mut().find(|record| record.key == prior.key) {
                Some(record) => {
                    *record = prior;
                    true
                }
                None => false,
            }
        });
    }

    fn find(&self, key: &str) -> Option<ArtifactRecord> {
        self.canonical
            .borrow()
            .iter()
            .find(|record| record.key == key)
            .cloned()
    }
}

/// Holds the `reconciling` flag for one cycle loop and releases it on
/// drop, including when the owning future is dropped mid-await.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
