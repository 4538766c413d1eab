use bdx_core::{DEFAULT_STORAGE_ID, RecordingMetadata, Segment, TopicMetadata};
use tracing::debug;

/// Caller-supplied settings for one reindex run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexOptions {
    /// Storage format of the recording's segments.
    pub storage_id: String,
    /// Replaces the recovered compression format when set.
    pub compression_format: Option<String>,
    /// Replaces the recovered compression mode when set.
    pub compression_mode: Option<String>,
}

impl Default for ReindexOptions {
    fn default() -> Self {
        Self {
            storage_id: DEFAULT_STORAGE_ID.to_string(),
            compression_format: None,
            compression_mode: None,
        }
    }
}

impl ReindexOptions {
    pub fn new(storage_id: impl Into<String>) -> Self {
        Self {
            storage_id: storage_id.into(),
            ..Self::default()
        }
    }
}

/// Rewrite the segment list of a recovered snapshot to match what is on disk.
///
/// Whatever list the backend reported is discarded and replaced with the
/// filenames of `segments`, in order, parent directories stripped.
pub fn reconcile_metadata(
    metadata: &mut RecordingMetadata,
    segments: &[Segment],
    options: &ReindexOptions,
) {
    metadata.relative_file_paths.clear();
    metadata
        .relative_file_paths
        .extend(segments.iter().map(Segment::file_name));

    if let Some(format) = &options.compression_format {
        metadata.compression_format.clone_from(format);
    }
    if let Some(mode) = &options.compression_mode {
        metadata.compression_mode.clone_from(mode);
    }

    debug!(
        target: "bagdex::reindex",
        segments = metadata.relative_file_paths.len(),
        compression_format = %metadata.compression_format,
        compression_mode = %metadata.compression_mode,
        "Reconciled segment list"
    );
}

/// Topic identities of `metadata` in recorded order, without counts.
#[must_use]
pub fn topics_metadata(metadata: &RecordingMetadata) -> Vec<TopicMetadata> {
    metadata
        .topics_with_message_count
        .iter()
        .map(|t| t.topic_metadata.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdx_core::{SegmentId, TopicInfo};
    use std::path::PathBuf;

    fn segment(id: u64, path: &str) -> Segment {
        Segment::new(SegmentId::new(id), PathBuf::from(path))
    }

    #[test]
    fn test_reconcile_replaces_backend_paths() {
        let mut metadata = RecordingMetadata {
            relative_file_paths: vec!["/somewhere/else/bag_0.db3".into()],
            ..Default::default()
        };
        let segments = [
            segment(0, "/data/bag/bag_0.db3"),
            segment(1, "/data/bag/bag_1.db3"),
            segment(5, "relative/dir/bag_5.db3"),
        ];

        reconcile_metadata(&mut metadata, &segments, &ReindexOptions::default());

        assert_eq!(
            metadata.relative_file_paths,
            vec!["bag_0.db3", "bag_1.db3", "bag_5.db3"]
        );
    }

    #[test]
    fn test_reconcile_empty_segment_list() {
        let mut metadata = RecordingMetadata {
            relative_file_paths: vec!["bag_0.db3".into()],
            ..Default::default()
        };

        reconcile_metadata(&mut metadata, &[], &ReindexOptions::default());
        assert!(metadata.relative_file_paths.is_empty());
    }

    #[test]
    fn test_reconcile_compression_overrides() {
        let mut metadata = RecordingMetadata {
            compression_format: "zstd".into(),
            compression_mode: "file".into(),
            ..Default::default()
        };

        reconcile_metadata(&mut metadata, &[], &ReindexOptions::default());
        assert_eq!(metadata.compression_format, "zstd");
        assert_eq!(metadata.compression_mode, "file");

        let options = ReindexOptions {
            compression_format: Some(String::new()),
            compression_mode: Some("message".into()),
            ..ReindexOptions::default()
        };
        reconcile_metadata(&mut metadata, &[], &options);
        assert_eq!(metadata.compression_format, "");
        assert_eq!(metadata.compression_mode, "message");
    }

    #[test]
    fn test_topics_metadata_drops_counts_keeps_order() {
        let metadata = RecordingMetadata {
            topics_with_message_count: vec![
                TopicInfo::new(TopicMetadata::new("/b", "pkg/msg/B", "cdr"), 5),
                TopicInfo::new(TopicMetadata::new("/a", "pkg/msg/A", "cdr"), 10),
            ],
            ..Default::default()
        };

        let topics = topics_metadata(&metadata);
        let names: Vec<_> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["/b", "/a"]);
        assert_eq!(metadata.topic_count(), 2);
    }
}
