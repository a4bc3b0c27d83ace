mod filter;
mod gate;
mod manager;
mod reconcile;

pub use gate::{EventGate, DEFAULT_QUIET_WINDOW};
pub use manager::ArtifactStore;
