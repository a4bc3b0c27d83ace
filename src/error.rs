use thiserror::Error;

use crate::record::ArtifactStatus;

/// A reconciliation cycle failed because one of the three sources could
/// not be read. The previously published canonical list stays in place.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog fetch failed: {0:#}")]
    Catalog(anyhow::Error),
    #[error("inventory scan failed: {0:#}")]
    Inventory(anyhow::Error),
    #[error("live status read failed: {0:#}")]
    LiveStatus(anyhow::Error),
}

/// A user-initiated action could not be carried out. Scoped to a single
/// artifact; the rest of the canonical list is unaffected.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown artifact {key:?}")]
    UnknownArtifact { key: String },
    #[error("artifact {key:?} has no download source")]
    NotInCatalog { key: String },
    #[error("artifact {key:?} is {status:?}, cannot {action}")]
    InvalidTransition {
        key: String,
        status: ArtifactStatus,
        action: &'static str,
    },
    #[error("engine {command} failed for {key:?}: {message}")]
    Engine {
        command: &'static str,
        key: String,
        message: String,
    },
}
