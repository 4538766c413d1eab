use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BagError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid recording directory {}: {reason}", .path.display())]
    InvalidRecordingDirectory { path: PathBuf, reason: String },

    #[error("Malformed segment name '{name}' - expected <prefix>_<number>.<extension>")]
    MalformedSegmentName { name: String },

    #[error("Duplicate segment id {id}: '{first}' and '{second}'")]
    DuplicateSegmentId {
        id: u64,
        first: String,
        second: String,
    },

    #[error("Failed to open segment {}: {reason}", .path.display())]
    SegmentOpenFailed { path: PathBuf, reason: String },

    #[error("No storage backend available for storage id '{storage_id}'")]
    StorageBackendUnavailable { storage_id: String },

    #[error("No segment files found in {}", .path.display())]
    NoSegmentsFound { path: PathBuf },

    #[error("Failed to write metadata to {}: {reason}", .path.display())]
    PersistFailed { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Discriminant of [`BagError`] without its context, cheap to copy into
/// state snapshots and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    InvalidRecordingDirectory,
    MalformedSegmentName,
    DuplicateSegmentId,
    SegmentOpenFailed,
    StorageBackendUnavailable,
    NoSegmentsFound,
    PersistFailed,
    Storage,
    Metadata,
    Config,
}

impl BagError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidRecordingDirectory { .. } => ErrorKind::InvalidRecordingDirectory,
            Self::MalformedSegmentName { .. } => ErrorKind::MalformedSegmentName,
            Self::DuplicateSegmentId { .. } => ErrorKind::DuplicateSegmentId,
            Self::SegmentOpenFailed { .. } => ErrorKind::SegmentOpenFailed,
            Self::StorageBackendUnavailable { .. } => ErrorKind::StorageBackendUnavailable,
            Self::NoSegmentsFound { .. } => ErrorKind::NoSegmentsFound,
            Self::PersistFailed { .. } => ErrorKind::PersistFailed,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Metadata(_) => ErrorKind::Metadata,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Soft errors describe a recording with nothing to do rather than a
    /// broken one; callers report them without failing.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoSegmentsFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, BagError>;
