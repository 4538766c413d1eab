use bdx_core::{BagError, RecordingMetadata, Result, Segment};
use bdx_storage::StorageBackend;
use std::path::PathBuf;
use tracing::{info, warn};

/// Metadata read from a single segment, before reconciliation.
#[derive(Debug, Clone)]
pub struct RecoveredSnapshot {
    pub metadata: RecordingMetadata,
    /// Segment the snapshot was taken from.
    pub source: PathBuf,
}

impl RecoveredSnapshot {
    #[must_use]
    pub fn has_topics(&self) -> bool {
        !self.metadata.topics_with_message_count.is_empty()
    }
}

/// Open `segment` read-only through `backend` and take its metadata snapshot.
///
/// The storage handle lives only inside this call and is closed before it
/// returns, on success or failure. Per-topic counts and time bounds are
/// taken as reported by the backend for this one segment.
///
/// # Errors
/// Returns [`BagError::SegmentOpenFailed`] if the backend cannot open or
/// introspect the segment.
pub fn recover_metadata(backend: &dyn StorageBackend, segment: &Segment) -> Result<RecoveredSnapshot> {
    let open_failed = |e: BagError| match e {
        BagError::SegmentOpenFailed { .. } => e,
        other => BagError::SegmentOpenFailed {
            path: segment.path.clone(),
            reason: other.to_string(),
        },
    };

    let metadata = {
        let mut handle = backend.open_read_only(&segment.path).map_err(open_failed)?;
        handle.get_metadata().map_err(open_failed)?
    };

    let snapshot = RecoveredSnapshot {
        metadata,
        source: segment.path.clone(),
    };

    if snapshot.has_topics() {
        info!(
            target: "bagdex::reindex",
            segment = %segment.path.display(),
            storage_id = backend.storage_id(),
            topics = snapshot.metadata.topic_count(),
            messages = snapshot.metadata.message_count,
            "Recovered metadata snapshot"
        );
    } else {
        warn!(
            target: "bagdex::reindex",
            segment = %segment.path.display(),
            storage_id = backend.storage_id(),
            "No topics were listed in recovered metadata"
        );
    }

    Ok(snapshot)
}
