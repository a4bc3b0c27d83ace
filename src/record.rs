use serde::{Deserialize, Serialize};

/// Lifecycle of a single downloadable artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactStatus {
    NotDownloaded,
    Downloading,
    Paused,
    Error,
    Downloaded,
    Removing,
}

/// One entry of the canonical artifact list.
///
/// Records are created and mutated only inside the store: either by a
/// reconciliation merge or by an optimistic action patch. `progress` is
/// meaningful only while a transfer is in flight and `error_message` only
/// in the `Error` state; `normalize` keeps those invariants after every
/// mutation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub key: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<String>,
    pub status: ArtifactStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub resumable: bool,
    pub downloaded: bool,
    pub downloading: bool,
}

impl ArtifactRecord {
    #[must_use]
    pub fn baseline(key: impl Into<String>, status: ArtifactStatus) -> Self {
        let key = key.into();
        let mut record = Self {
            display_name: key.clone(),
            key,
            source_url: None,
            size_hint: None,
            status,
            progress: None,
            error_message: None,
            resumable: false,
            downloaded: false,
            downloading: false,
        };
        record.normalize();
        record
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        matches!(
            self.status,
            ArtifactStatus::Downloading | ArtifactStatus::Paused
        )
    }

    /// Re-derives the convenience flags and drops fields that are not
    /// meaningful in the current status.
    pub fn normalize(&mut self) {
        self.downloaded = self.status == ArtifactStatus::Downloaded;
        self.downloading = self.status == ArtifactStatus::Downloading;
        if !self.in_flight() {
            self.progress = None;
        }
        if self.status != ArtifactStatus::Error {
            self.error_message = None;
        }
    }
}
