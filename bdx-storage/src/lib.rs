#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod backend;
mod metadata_io;
mod sqlite;

pub use backend::{ReadOnlyStorage, StorageBackend, StorageFactory};
pub use metadata_io::{MetadataIo, YamlMetadataIo};
pub use sqlite::{SQLITE_SEGMENT_EXTENSION, SQLITE_STORAGE_ID, Sqlite3Backend, SqliteStorage};
