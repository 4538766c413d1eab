use bdx_core::{BagError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the segment files directly inside `dir`.
///
/// Only regular files whose extension equals `extension` (no leading dot)
/// are returned; everything else, including the index file and any
/// subdirectory, is ignored. The result is in directory order.
///
/// # Errors
/// Returns [`BagError::InvalidRecordingDirectory`] if `dir` is missing, not
/// a directory, or cannot be listed.
pub fn discover_segments(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(BagError::InvalidRecordingDirectory {
            path: dir.to_path_buf(),
            reason: "does not exist".into(),
        });
    }
    if !dir.is_dir() {
        return Err(BagError::InvalidRecordingDirectory {
            path: dir.to_path_buf(),
            reason: "not a directory".into(),
        });
    }

    let unreadable = |e: std::io::Error| BagError::InvalidRecordingDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    let mut segments = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();

        if !path.is_file() {
            continue;
        }

        if path.extension().is_some_and(|ext| ext == extension) {
            segments.push(path);
        }
    }

    debug!(
        target: "bagdex::reindex",
        dir = %dir.display(),
        extension,
        found = segments.len(),
        "Segment discovery complete"
    );

    Ok(segments)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bdx_core::ErrorKind;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_discover_filters_by_extension() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("bag_0.db3")).unwrap();
        File::create(dir.path().join("bag_1.db3")).unwrap();
        File::create(dir.path().join("metadata.yaml")).unwrap();
        File::create(dir.path().join("bag_1.db3-wal")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let mut found = discover_segments(dir.path(), "db3").unwrap();
        found.sort();

        assert_eq!(
            found,
            vec![dir.path().join("bag_0.db3"), dir.path().join("bag_1.db3")]
        );
    }

    #[test]
    fn test_discover_does_not_descend() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(dir.path().join("nested").join("bag_5.db3")).unwrap();
        std::fs::create_dir(dir.path().join("fake_9.db3")).unwrap();

        let found = discover_segments(dir.path(), "db3").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(discover_segments(dir.path(), "db3").unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempdir().unwrap();
        let err = discover_segments(&dir.path().join("absent"), "db3")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidRecordingDirectory);
    }

    #[test]
    fn test_discover_file_instead_of_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bag_0.db3");
        File::create(&file).unwrap();

        let err = discover_segments(&file, "db3").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidRecordingDirectory);
        assert!(err.to_string().contains("not a directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        File::create(locked.join("bag_0.db3")).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let result = discover_segments(&locked, "db3");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can still list the directory.
        if let Err(err) = result {
            assert_eq!(err.kind(), ErrorKind::InvalidRecordingDirectory);
            assert!(err.to_string().contains("locked"));
        }
    }
}
