use bdx_core::RecordingMetadata;
use std::path::Path;
use tracing::{debug, warn};

/// Recompute `bag_size` from the segments currently on disk.
///
/// Each entry of `relative_file_paths` is resolved against `dir`. Entries
/// that no longer exist, or are not regular files, contribute nothing.
/// Backend-reported sizes are ignored.
pub fn finalize_metadata(dir: &Path, metadata: &mut RecordingMetadata) {
    let mut total = 0u64;

    for relative in &metadata.relative_file_paths {
        let path = dir.join(relative);

        match std::fs::metadata(&path) {
            Ok(m) if m.is_file() => {
                total = total.saturating_add(m.len());
            },
            Ok(_) => {
                debug!(
                    target: "bagdex::reindex",
                    path = %path.display(),
                    "Listed segment is not a regular file, skipping"
                );
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    target: "bagdex::reindex",
                    path = %path.display(),
                    "Listed segment missing from disk, skipping"
                );
            },
            Err(e) => {
                warn!(
                    target: "bagdex::reindex",
                    path = %path.display(),
                    error = %e,
                    "Failed to stat listed segment, skipping"
                );
            },
        }
    }

    metadata.bag_size = total;

    debug!(
        target: "bagdex::reindex",
        dir = %dir.display(),
        bag_size = metadata.bag_size,
        "Size finalization complete"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_finalize_sums_existing_segments() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bag_0.db3"), vec![0u8; 100]).unwrap();
        std::fs::write(dir.path().join("bag_1.db3"), vec![0u8; 250]).unwrap();

        let mut metadata = RecordingMetadata {
            relative_file_paths: vec!["bag_0.db3".into(), "bag_1.db3".into()],
            bag_size: 999_999,
            ..Default::default()
        };

        finalize_metadata(dir.path(), &mut metadata);
        assert_eq!(metadata.bag_size, 350);
    }

    #[test]
    fn test_finalize_skips_missing_segments() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("bag_0.db3"), vec![0u8; 64]).unwrap();

        let mut metadata = RecordingMetadata {
            relative_file_paths: vec!["bag_0.db3".into(), "bag_1.db3".into()],
            ..Default::default()
        };

        finalize_metadata(dir.path(), &mut metadata);
        assert_eq!(metadata.bag_size, 64);
    }

    #[test]
    fn test_finalize_ignores_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bag_0.db3")).unwrap();

        let mut metadata = RecordingMetadata {
            relative_file_paths: vec!["bag_0.db3".into()],
            bag_size: 7,
            ..Default::default()
        };

        finalize_metadata(dir.path(), &mut metadata);
        assert_eq!(metadata.bag_size, 0);
    }

    #[test]
    fn test_finalize_empty_list_resets_size() {
        let dir = tempdir().unwrap();
        let mut metadata = RecordingMetadata {
            bag_size: 42,
            ..Default::default()
        };

        finalize_metadata(dir.path(), &mut metadata);
        assert_eq!(metadata.bag_size, 0);
    }
}
