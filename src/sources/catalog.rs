use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;

use super::{CatalogEntry, CatalogSource};

const HF_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

static BUILTIN_CATALOG: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    [
        ("tiny", 77_691_713_u64),
        ("base", 147_951_465),
        ("small", 487_601_967),
        ("medium", 1_533_763_059),
        ("large-v3-turbo", 1_624_555_275),
    ]
    .into_iter()
    .map(|(name, bytes)| CatalogEntry {
        name: name.to_string(),
        url: format!("{HF_BASE}/ggml-{name}.bin"),
        size_hint: Some(human_readable_size(bytes)),
    })
    .collect()
});

/// Catalog backed by a fixed entry list. The default set is the whisper
/// model family hosted on Hugging Face.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(BUILTIN_CATALOG.clone())
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}

#[must_use]
pub fn human_readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.0} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.0} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}
