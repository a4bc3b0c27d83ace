use std::collections::{HashMap, HashSet};

use crate::naming::StorageNaming;
use crate::record::{ArtifactRecord, ArtifactStatus};
use crate::sources::{CatalogEntry, LiveState};

/// Merges the three source snapshots into the ordered canonical list.
///
/// Catalog order is authoritative; inventory-only artifacts are appended
/// in discovery order. A live entry fully supersedes the catalog and
/// inventory baseline whenever its status maps to a canonical one, since
/// it reflects in-flight engine truth the static sources cannot see.
/// Live entries that match neither catalog nor inventory are stale and
/// ignored.
pub(crate) fn merge(
    naming: &StorageNaming,
    catalog: &[CatalogEntry],
    inventory: &[String],
    live: &HashMap<String, LiveState>,
) -> Vec<ArtifactRecord> {
    let local: HashSet<&str> = inventory
        .iter()
        .filter(|name| naming.matches(name))
        .map(String::as_str)
        .collect();

    let mut records = Vec::with_capacity(catalog.len());
    let mut seen_storage: HashSet<String> = HashSet::new();

    for entry in catalog {
        let storage_name = naming.storage_name(&entry.name);
        let baseline = if local.contains(storage_name.as_str()) {
            ArtifactStatus::Downloaded
        } else {
            ArtifactStatus::NotDownloaded
        };
        let mut record = ArtifactRecord::baseline(entry.name.clone(), baseline);
        record.source_url = Some(entry.url.clone());
        record.size_hint = entry.size_hint.clone();
        overlay_live(&mut record, live.get(&storage_name));
        seen_storage.insert(storage_name);
        records.push(record);
    }

    // Artifacts present only on disk: no source URL, still fully managed.
    for file_name in inventory {
        let Some(key) = naming.key_of(file_name) else {
            continue;
        };
        if seen_storage.contains(file_name) {
            continue;
        }
        let mut record = ArtifactRecord::baseline(key, ArtifactStatus::Downloaded);
        overlay_live(&mut record, live.get(file_name));
        seen_storage.insert(file_name.clone());
        records.push(record);
    }

    for storage_name in live.keys() {
        if !seen_storage.contains(storage_name) {
            tracing::debug!(%storage_name, "ignoring live status for unknown artifact");
        }
    }

    records
}

fn overlay_live(record: &mut ArtifactRecord, live: Option<&LiveState>) {
    let Some(live) = live else {
        return;
    };
    let Some(status) = live.status.canonical() else {
        return;
    };
    record.status = status;
    record.progress = Some(live.progress.min(100));
    record.error_message = live.error.clone();
    record.resumable = live.resumable;
    record.normalize();
}
