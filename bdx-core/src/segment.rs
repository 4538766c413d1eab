use std::fmt;
use std::path::{Path, PathBuf};

/// Sequence number embedded in a segment filename (`bag_12.db3` -> 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(u64);

impl SegmentId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A discovered segment file paired with its parsed sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: SegmentId,
    pub path: PathBuf,
}

impl Segment {
    #[must_use]
    pub fn new(id: SegmentId, path: PathBuf) -> Self {
        Self { id, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename with all parent components stripped.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
