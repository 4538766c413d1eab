use crate::sqlite::{SQLITE_SEGMENT_EXTENSION, Sqlite3Backend};
use bdx_core::{BagError, RecordingMetadata, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// An open, read-only view of one segment file.
///
/// Dropping the handle releases every resource it holds.
pub trait ReadOnlyStorage: Send {
    /// Introspect the segment and describe the recording it belongs to.
    ///
    /// # Errors
    /// Returns an error if the segment's contents cannot be queried.
    fn get_metadata(&mut self) -> Result<RecordingMetadata>;

    /// Path the handle was opened with.
    fn relative_file_path(&self) -> &Path;
}

/// One storage format: knows its segment extension and how to open a
/// segment of that format.
pub trait StorageBackend: Send + Sync {
    fn storage_id(&self) -> &str;

    /// File extension of segment files, without the leading dot.
    fn segment_extension(&self) -> &str;

    /// # Errors
    /// Returns an error if the file is missing, unreadable, or not in this
    /// backend's format.
    fn open_read_only(&self, path: &Path) -> Result<Box<dyn ReadOnlyStorage>>;
}

/// Registry of storage backends keyed by storage identifier.
pub struct StorageFactory {
    backends: BTreeMap<String, Box<dyn StorageBackend>>,
}

impl StorageFactory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: BTreeMap::new(),
        }
    }

    /// Factory with every backend this crate ships.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut factory = Self::new();
        factory.register(Box::new(Sqlite3Backend));
        factory
    }

    /// Register a backend, replacing any previous one with the same id.
    pub fn register(&mut self, backend: Box<dyn StorageBackend>) {
        let storage_id = backend.storage_id().to_string();
        debug!(
            target: "bagdex::storage",
            storage_id = %storage_id,
            extension = backend.segment_extension(),
            "Registered storage backend"
        );
        self.backends.insert(storage_id, backend);
    }

    /// # Errors
    /// Returns [`BagError::StorageBackendUnavailable`] if nothing is
    /// registered under `storage_id`.
    pub fn backend(&self, storage_id: &str) -> Result<&dyn StorageBackend> {
        self.backends
            .get(storage_id)
            .map(|backend| &**backend)
            .ok_or_else(|| BagError::StorageBackendUnavailable {
                storage_id: storage_id.to_string(),
            })
    }

    /// Extension of the segment files written under `storage_id`.
    ///
    /// Falls back to the sqlite3 extension when no backend is registered
    /// under that id, so a directory can still be scanned before the backend
    /// is resolved.
    #[must_use]
    pub fn segment_extension(&self, storage_id: &str) -> &str {
        self.backends
            .get(storage_id)
            .map_or(SQLITE_SEGMENT_EXTENSION, |backend| backend.segment_extension())
    }

    pub fn storage_ids(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }
}

impl Default for StorageFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}
