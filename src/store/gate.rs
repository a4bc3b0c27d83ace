use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::ArtifactStore;
use crate::sources::Subscription;

pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Debounced bridge between the live source's push channel and the
/// store's reconciliation entry point.
///
/// Leading-edge debounce with a refractory period: a notification
/// triggers a reconciliation only when `quiet_window` has elapsed since
/// the last accepted trigger. Notifications inside the window are
/// dropped, not queued; the next accepted trigger reads fresh snapshots
/// anyway.
pub struct EventGate {
    subscription: Subscription,
    task: Option<JoinHandle<()>>,
}

impl EventGate {
    #[must_use]
    pub fn spawn(store: Arc<ArtifactStore>, quiet_window: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = store.live_source().subscribe(Arc::new(move || {
            let _ = tx.send(());
        }));
        let task = tokio::spawn(async move {
            let mut last_accepted: Option<Instant> = None;
            while rx.recv().await.is_some() {
                let now = Instant::now();
                if let Some(last) = last_accepted {
                    if now.duration_since(last) < quiet_window {
                        continue;
                    }
                }
                last_accepted = Some(now);
                if let Err(error) = store.reconcile().await {
                    tracing::warn!("event-triggered reconciliation failed: {error}");
                }
            }
        });
        Self {
            subscription,
            task: Some(task),
        }
    }

    /// Unsubscribes from the live source and waits for the gate task,
    /// letting an in-flight reconciliation finish before teardown.
    pub async fn shutdown(mut self) {
        self.subscription.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for EventGate {
    fn drop(&mut self) {
        self.subscription.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::sources::{
        AcquisitionEngine, CatalogEntry, CatalogSource, InventorySource, StateTable,
    };

    struct CountingCatalog {
        fetches: AtomicUsize,
        hold: AtomicBool,
        release: Notify,
    }

    impl CountingCatalog {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                hold: AtomicBool::new(false),
                release: Notify::new(),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for CountingCatalog {
        async fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.hold.load(Ordering::SeqCst) {
                self.release.notified().await;
            }
            Ok(vec![CatalogEntry {
                name: "base".into(),
                url: "https://models.example/ggml-base.bin".into(),
                size_hint: None,
            }])
        }
    }

    struct EmptyInventory;

    #[async_trait]
    impl InventorySource for EmptyInventory {
        async fn list_local_files(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct NoopEngine;

    #[async_trait]
    impl AcquisitionEngine for NoopEngine {
        async fn start(&self, _storage_name: &str) -> Result<()> {
            Ok(())
        }

        async fn pause(&self, _storage_name: &str) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _storage_name: &str) -> Result<()> {
            Ok(())
        }
    }

    fn fixture() -> (Arc<ArtifactStore>, Arc<CountingCatalog>, Arc<StateTable>) {
        let catalog = Arc::new(CountingCatalog::new());
        let live = Arc::new(StateTable::in_memory());
        let store = Arc::new(ArtifactStore::new(
            catalog.clone(),
            Arc::new(EmptyInventory),
            live.clone(),
            Arc::new(NoopEngine),
        ));
        (store, catalog, live)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_reconciliation() {
        let (store, catalog, live) = fixture();
        let gate = EventGate::spawn(store, Duration::from_millis(500));

        for _ in 0..5 {
            live.patch("ggml-base.bin", |state| state.progress += 1);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        live.patch("ggml-base.bin", |state| state.progress += 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 2);

        gate.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_event_handling() {
        let (store, catalog, live) = fixture();
        let gate = EventGate::spawn(store, Duration::from_millis(500));

        live.patch("ggml-base.bin", |state| state.progress = 10);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);

        gate.shutdown().await;
        live.patch("ggml-base.bin", |state| state.progress = 20);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_gate_unsubscribes() {
        let (store, catalog, live) = fixture();
        let gate = EventGate::spawn(store, Duration::from_millis(500));
        drop(gate);

        live.patch("ggml-base.bin", |state| state.progress = 10);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_gate_mid_cycle_leaves_the_store_usable() {
        let (store, catalog, live) = fixture();
        catalog.hold.store(true, Ordering::SeqCst);
        let gate = EventGate::spawn(store.clone(), Duration::from_millis(500));

        live.patch("ggml-base.bin", |state| state.progress = 10);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
        assert!(store.is_reconciling());

        // Dropping the gate aborts its task mid-cycle; the store must not
        // stay marked busy.
        drop(gate);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!store.is_reconciling());

        catalog.hold.store(false, Ordering::SeqCst);
        store.reconcile().await.unwrap();
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 2);
        assert!(!store.artifacts().is_empty());
    }
}
