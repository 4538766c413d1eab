use bdx_core::{BagError, METADATA_FILENAME, RecordingMetadata, Result, TopicInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads and writes a recording's index file.
pub trait MetadataIo {
    /// Write `metadata` as the index of the recording in `dir`, replacing any
    /// existing index.
    ///
    /// # Errors
    /// Returns [`BagError::PersistFailed`] if the index cannot be written.
    fn write_metadata(&self, dir: &Path, metadata: &RecordingMetadata) -> Result<()>;

    /// # Errors
    /// Fails if the index is missing or cannot be parsed.
    fn read_metadata(&self, dir: &Path) -> Result<RecordingMetadata>;

    fn metadata_file_path(&self, dir: &Path) -> PathBuf;

    fn metadata_file_exists(&self, dir: &Path) -> bool {
        self.metadata_file_path(dir).is_file()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MetadataDocument {
    rosbag2_bagfile_information: BagfileInformation,
}

#[derive(Debug, Serialize, Deserialize)]
struct BagfileInformation {
    version: u32,
    storage_identifier: String,
    relative_file_paths: Vec<String>,
    duration: DurationField,
    starting_time: StartingTimeField,
    message_count: u64,
    topics_with_message_count: Vec<TopicInfo>,
    #[serde(default)]
    bag_size: u64,
    #[serde(default)]
    compression_format: String,
    #[serde(default)]
    compression_mode: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DurationField {
    nanoseconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StartingTimeField {
    nanoseconds_since_epoch: u64,
}

impl From<&RecordingMetadata> for MetadataDocument {
    fn from(metadata: &RecordingMetadata) -> Self {
        Self {
            rosbag2_bagfile_information: BagfileInformation {
                version: metadata.version,
                storage_identifier: metadata.storage_identifier.clone(),
                relative_file_paths: metadata.relative_file_paths.clone(),
                duration: DurationField {
                    nanoseconds: metadata.duration_ns,
                },
                starting_time: StartingTimeField {
                    nanoseconds_since_epoch: metadata.starting_time_ns,
                },
                message_count: metadata.message_count,
                topics_with_message_count: metadata.topics_with_message_count.clone(),
                bag_size: metadata.bag_size,
                compression_format: metadata.compression_format.clone(),
                compression_mode: metadata.compression_mode.clone(),
            },
        }
    }
}

impl From<MetadataDocument> for RecordingMetadata {
    fn from(doc: MetadataDocument) -> Self {
        let info = doc.rosbag2_bagfile_information;
        Self {
            version: info.version,
            storage_identifier: info.storage_identifier,
            relative_file_paths: info.relative_file_paths,
            starting_time_ns: info.starting_time.nanoseconds_since_epoch,
            duration_ns: info.duration.nanoseconds,
            message_count: info.message_count,
            topics_with_message_count: info.topics_with_message_count,
            bag_size: info.bag_size,
            compression_format: info.compression_format,
            compression_mode: info.compression_mode,
        }
    }
}

/// Persists metadata as `metadata.yaml` inside the recording directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlMetadataIo;

impl YamlMetadataIo {
    /// Render `metadata` exactly as [`MetadataIo::write_metadata`] would.
    ///
    /// # Errors
    /// Fails if serialization fails.
    pub fn to_yaml(metadata: &RecordingMetadata) -> Result<String> {
        serde_yaml::to_string(&MetadataDocument::from(metadata))
            .map_err(|e| BagError::Metadata(format!("YAML serialize error: {}", e)))
    }

    /// # Errors
    /// Fails if `content` is not a valid index document.
    pub fn from_yaml(content: &str) -> Result<RecordingMetadata> {
        serde_yaml::from_str::<MetadataDocument>(content)
            .map(RecordingMetadata::from)
            .map_err(|e| BagError::Metadata(format!("YAML parse error: {}", e)))
    }
}

impl MetadataIo for YamlMetadataIo {
    fn write_metadata(&self, dir: &Path, metadata: &RecordingMetadata) -> Result<()> {
        let path = self.metadata_file_path(dir);
        let persist_err = |reason: String| BagError::PersistFailed {
            path: path.clone(),
            reason,
        };

        if !dir.is_dir() {
            return Err(persist_err("not a directory".into()));
        }

        let content = Self::to_yaml(metadata).map_err(|e| persist_err(e.to_string()))?;

        // Write beside the target and rename so readers never see a partial index.
        let tmp_path = path.with_extension("yaml.tmp");
        let written =
            std::fs::write(&tmp_path, content).and_then(|()| std::fs::rename(&tmp_path, &path));
        if let Err(e) = written {
            if tmp_path.is_file() {
                let _ = std::fs::remove_file(&tmp_path);
            }
            return Err(persist_err(e.to_string()));
        }

        info!(
            target: "bagdex::storage",
            path = %path.display(),
            segments = metadata.relative_file_paths.len(),
            topics = metadata.topic_count(),
            bag_size = metadata.bag_size,
            "Wrote recording metadata"
        );

        Ok(())
    }

    fn read_metadata(&self, dir: &Path) -> Result<RecordingMetadata> {
        let content = std::fs::read_to_string(self.metadata_file_path(dir))?;
        Self::from_yaml(&content)
    }

    fn metadata_file_path(&self, dir: &Path) -> PathBuf {
        dir.join(METADATA_FILENAME)
    }
}
