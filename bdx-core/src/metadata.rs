use serde::{Deserialize, Serialize};

/// Identity of one recorded topic, without its message count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub serialization_format: String,
    /// QoS profiles as recorded, kept as the opaque string the writer stored.
    #[serde(default)]
    pub offered_qos_profiles: String,
}

impl TopicMetadata {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        serialization_format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            serialization_format: serialization_format.into(),
            offered_qos_profiles: String::new(),
        }
    }

    #[must_use]
    pub fn with_qos(mut self, offered_qos_profiles: impl Into<String>) -> Self {
        self.offered_qos_profiles = offered_qos_profiles.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub topic_metadata: TopicMetadata,
    pub message_count: u64,
}

impl TopicInfo {
    #[must_use]
    pub fn new(topic_metadata: TopicMetadata, message_count: u64) -> Self {
        Self {
            topic_metadata,
            message_count,
        }
    }
}

/// Everything an index file records about a recording.
///
/// `relative_file_paths` holds segment filenames relative to the recording
/// directory, in segment order. `bag_size` is the summed on-disk size of
/// those segments at the time the index was built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingMetadata {
    pub version: u32,
    pub storage_identifier: String,
    pub relative_file_paths: Vec<String>,
    pub starting_time_ns: u64,
    pub duration_ns: u64,
    pub message_count: u64,
    pub topics_with_message_count: Vec<TopicInfo>,
    pub bag_size: u64,
    pub compression_format: String,
    pub compression_mode: String,
}

impl RecordingMetadata {
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics_with_message_count.len()
    }

    /// End of the recorded time range, saturating on overflow.
    #[must_use]
    pub fn ending_time_ns(&self) -> u64 {
        self.starting_time_ns.saturating_add(self.duration_ns)
    }

    pub fn topic(&self, name: &str) -> Option<&TopicInfo> {
        self.topics_with_message_count
            .iter()
            .find(|t| t.topic_metadata.name == name)
    }
}
