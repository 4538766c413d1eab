//! `sqlite3` storage backend.
//!
//! Each segment is a SQLite database with a `topics` table
//! (`id, name, type, serialization_format[, offered_qos_profiles]`) and a
//! `messages` table (`id, topic_id, timestamp, data`). Metadata is derived
//! from aggregate queries over those tables; message payloads are never read.

use crate::backend::{ReadOnlyStorage, StorageBackend};
use bdx_core::{BagError, METADATA_VERSION, RecordingMetadata, Result, TopicInfo, TopicMetadata};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SQLITE_STORAGE_ID: &str = "sqlite3";
pub const SQLITE_SEGMENT_EXTENSION: &str = "db3";

const REQUIRED_TABLES: [&str; 2] = ["topics", "messages"];

fn sqlite_err(path: &Path, e: &rusqlite::Error) -> BagError {
    BagError::Storage(format!("{}: {}", path.display(), e))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite3Backend;

impl StorageBackend for Sqlite3Backend {
    fn storage_id(&self) -> &str {
        SQLITE_STORAGE_ID
    }

    fn segment_extension(&self) -> &str {
        SQLITE_SEGMENT_EXTENSION
    }

    fn open_read_only(&self, path: &Path) -> Result<Box<dyn ReadOnlyStorage>> {
        Ok(Box::new(SqliteStorage::open(path)?))
    }
}

pub struct SqliteStorage {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStorage {
    /// Open `path` read-only and check that it carries the recording schema.
    ///
    /// # Errors
    /// Fails if the file does not exist, is not a SQLite database, or lacks
    /// the `topics`/`messages` tables.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BagError::Storage(format!(
                "{}: not a regular file",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| sqlite_err(path, &e))?;

        let storage = Self {
            conn,
            path: path.to_path_buf(),
        };
        storage.check_schema()?;

        debug!(
            target: "bagdex::storage",
            path = %storage.path.display(),
            "Opened sqlite3 segment read-only"
        );

        Ok(storage)
    }

    fn check_schema(&self) -> Result<()> {
        for table in REQUIRED_TABLES {
            let count: i64 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .map_err(|e| sqlite_err(&self.path, &e))?;

            if count == 0 {
                return Err(BagError::Storage(format!(
                    "{}: missing '{}' table",
                    self.path.display(),
                    table
                )));
            }
        }
        Ok(())
    }

    /// Older recordings predate the QoS column on `topics`.
    fn has_qos_column(&self) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("PRAGMA table_info(topics)")
            .map_err(|e| sqlite_err(&self.path, &e))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| sqlite_err(&self.path, &e))?;

        for column in columns {
            if column.map_err(|e| sqlite_err(&self.path, &e))? == "offered_qos_profiles" {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn file_size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

struct TopicRow {
    topic: TopicMetadata,
    count: i64,
    min_ts: Option<i64>,
    max_ts: Option<i64>,
}

fn clamp_ns(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl ReadOnlyStorage for SqliteStorage {
    fn get_metadata(&mut self) -> Result<RecordingMetadata> {
        let qos_column = if self.has_qos_column()? {
            "t.offered_qos_profiles"
        } else {
            "''"
        };
        let sql = format!(
            "SELECT t.name, t.type, t.serialization_format, {qos_column}, \
             COUNT(m.id), MIN(m.timestamp), MAX(m.timestamp) \
             FROM topics t LEFT JOIN messages m ON m.topic_id = t.id \
             GROUP BY t.id ORDER BY t.id"
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| sqlite_err(&self.path, &e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TopicRow {
                    topic: TopicMetadata::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    )
                    .with_qos(row.get::<_, Option<String>>(3)?.unwrap_or_default()),
                    count: row.get(4)?,
                    min_ts: row.get(5)?,
                    max_ts: row.get(6)?,
                })
            })
            .map_err(|e| sqlite_err(&self.path, &e))?;

        let mut topics = Vec::new();
        let mut message_count = 0u64;
        let mut min_time: Option<i64> = None;
        let mut max_time: Option<i64> = None;

        for row in rows {
            let row = row.map_err(|e| sqlite_err(&self.path, &e))?;
            let count = clamp_ns(row.count);
            message_count = message_count.saturating_add(count);

            if let Some(ts) = row.min_ts {
                min_time = Some(min_time.map_or(ts, |m| m.min(ts)));
            }
            if let Some(ts) = row.max_ts {
                max_time = Some(max_time.map_or(ts, |m| m.max(ts)));
            }

            topics.push(TopicInfo::new(row.topic, count));
        }

        let (starting_time_ns, duration_ns) = match (min_time, max_time) {
            (Some(min), Some(max)) => (clamp_ns(min), clamp_ns(max.saturating_sub(min))),
            _ => (0, 0),
        };

        info!(
            target: "bagdex::storage",
            path = %self.path.display(),
            topics = topics.len(),
            messages = message_count,
            "Read sqlite3 segment metadata"
        );

        Ok(RecordingMetadata {
            version: METADATA_VERSION,
            storage_identifier: SQLITE_STORAGE_ID.to_string(),
            relative_file_paths: vec![self.path.to_string_lossy().into_owned()],
            starting_time_ns,
            duration_ns,
            message_count,
            topics_with_message_count: topics,
            bag_size: self.file_size(),
            compression_format: String::new(),
            compression_mode: String::new(),
        })
    }

    fn relative_file_path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SqliteStorage {
    fn drop(&mut self) {
        debug!(
            target: "bagdex::storage",
            path = %self.path.display(),
            "Closed sqlite3 segment"
        );
    }
}
