#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod metadata;
mod segment;

pub use error::{BagError, ErrorKind, Result};
pub use metadata::{RecordingMetadata, TopicInfo, TopicMetadata};
pub use segment::{Segment, SegmentId};

/// Schema version written into freshly rebuilt index files.
pub const METADATA_VERSION: u32 = 4;
pub const METADATA_FILENAME: &str = "metadata.yaml";
pub const DEFAULT_STORAGE_ID: &str = "sqlite3";
