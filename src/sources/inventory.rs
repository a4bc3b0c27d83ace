use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;

use super::InventorySource;

/// Inventory source backed by a flat models directory. Only regular files
/// are reported; filtering against the storage naming convention happens
/// in the reconciler.
#[derive(Debug, Clone)]
pub struct DirInventory {
    root: PathBuf,
}

impl DirInventory {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Inventory rooted at the per-user models directory.
    pub fn at_default_path() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "PushToTalk", "PushToTalk")
            .context("missing project directories")?;
        let dir = project_dirs.data_dir().join("models");
        fs::create_dir_all(&dir).context("create models dir")?;
        Ok(Self::new(dir))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }
}

#[async_trait]
impl InventorySource for DirInventory {
    async fn list_local_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("read models dir {}", self.root.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.context("read models dir entry")?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                files.push(name.to_string());
            }
        }
        files.sort();
        Ok(files)
    }
}
