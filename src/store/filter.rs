use crate::record::ArtifactRecord;

/// Semantic equality for published snapshots. Display-only fields
/// (`display_name`, `source_url`, `size_hint`) never change after record
/// creation, so they are excluded from the comparison.
pub(crate) fn snapshots_equal(previous: &[ArtifactRecord], next: &[ArtifactRecord]) -> bool {
    previous.len() == next.len()
        && previous
            .iter()
            .zip(next)
            .all(|(a, b)| records_agree(a, b))
}

fn records_agree(a: &ArtifactRecord, b: &ArtifactRecord) -> bool {
    a.key == b.key
        && a.status == b.status
        && a.progress == b.progress
        && a.error_message == b.error_message
        && a.downloaded == b.downloaded
        && a.downloading == b.downloading
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ArtifactStatus;

    fn record(key: &str, status: ArtifactStatus) -> ArtifactRecord {
        ArtifactRecord::baseline(key, status)
    }

    #[test]
    fn identical_lists_are_equal() {
        let a = vec![record("tiny", ArtifactStatus::Downloaded)];
        let b = vec![record("tiny", ArtifactStatus::Downloaded)];
        assert!(snapshots_equal(&a, &b));
    }

    #[test]
    fn display_only_differences_do_not_count() {
        let a = vec![record("tiny", ArtifactStatus::Downloaded)];
        let mut b = a.clone();
        b[0].size_hint = Some("75 MB".into());
        b[0].source_url = Some("https://models.example/ggml-tiny.bin".into());
        assert!(snapshots_equal(&a, &b));
    }

    #[test]
    fn status_and_progress_differences_count() {
        let a = vec![record("tiny", ArtifactStatus::Downloading)];
        let mut b = a.clone();
        b[0].progress = Some(10);
        assert!(!snapshots_equal(&a, &b));

        let c = vec![record("tiny", ArtifactStatus::Paused)];
        assert!(!snapshots_equal(&a, &c));
    }

    #[test]
    fn length_differences_count() {
        let a = vec![record("tiny", ArtifactStatus::Downloaded)];
        assert!(!snapshots_equal(&a, &[]));
    }
}
