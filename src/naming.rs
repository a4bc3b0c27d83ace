use serde::{Deserialize, Serialize};

/// Storage filename convention: an artifact named `base` is stored as
/// `ggml-base.bin` by default. Inventory matching and live-status lookup
/// both go through this mapping, so the two key spaces stay aligned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageNaming {
    pub prefix: String,
    pub suffix: String,
}

impl Default for StorageNaming {
    fn default() -> Self {
        Self {
            prefix: "ggml-".into(),
            suffix: ".bin".into(),
        }
    }
}

impl StorageNaming {
    #[must_use]
    pub fn storage_name(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, key, self.suffix)
    }

    /// Maps a storage filename back to its artifact key. Returns `None`
    /// for files that do not follow the convention.
    #[must_use]
    pub fn key_of(&self, file_name: &str) -> Option<String> {
        let stem = file_name.strip_prefix(self.prefix.as_str())?;
        let key = stem.strip_suffix(self.suffix.as_str())?;
        if key.is_empty() {
            return None;
        }
        Some(key.to_string())
    }

    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.key_of(file_name).is_some()
    }
}
