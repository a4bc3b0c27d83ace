//! Acquisition state manager for large, individually addressable
//! downloadable artifacts (speech model files).
//!
//! Three partially overlapping sources of truth feed the manager: a
//! static catalog of known artifacts, the local on-disk inventory, and a
//! live status table pushed by the acquisition engine. [`ArtifactStore`]
//! reconciles them into one canonical per-artifact list, drives
//! user-initiated transitions (download, pause, retry, remove) against
//! the engine, and publishes snapshots to observers only when something
//! actually changed. [`EventGate`] absorbs bursts of engine push
//! notifications so a progress storm costs at most one reconciliation
//! per quiet window.
//!
//! The byte transfer itself, checksum verification, and bandwidth
//! scheduling belong to the engine behind [`sources::AcquisitionEngine`].

pub mod error;
pub mod naming;
pub mod record;
pub mod sources;
pub mod store;

pub use error::{ActionError, FetchError};
pub use naming::StorageNaming;
pub use record::{ArtifactRecord, ArtifactStatus};
pub use sources::{
    AcquisitionEngine, CatalogEntry, CatalogSource, InventorySource, LiveState, LiveStatus,
    LiveStatusSource, Subscription,
};
pub use store::{ArtifactStore, EventGate, DEFAULT_QUIET_WINDOW};
