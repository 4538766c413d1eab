use bdx_core::{BagError, DEFAULT_STORAGE_ID, Result};
use bdx_reindex::ReindexOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Storage format of the recordings handled by this tool
    #[serde(default = "default_storage_id")]
    pub storage_id: String,
    /// Compression format recorded in rebuilt indexes (kept from the segment when unset)
    #[serde(default)]
    pub compression_format: Option<String>,
    /// Compression mode recorded in rebuilt indexes (kept from the segment when unset)
    #[serde(default)]
    pub compression_mode: Option<String>,
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_storage_id() -> String {
    DEFAULT_STORAGE_ID.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_id: default_storage_id(),
            compression_format: None,
            compression_mode: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext {
            "toml" => toml::from_str(&content)
                .map_err(|e| BagError::Config(format!("TOML parse error: {}", e))),
            "json" => serde_json::from_str(&content)
                .map_err(|e| BagError::Config(format!("JSON parse error: {}", e))),
            _ => Err(BagError::Config(format!(
                "Unknown config file extension: {}",
                ext
            ))),
        }
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Command-line values win over whatever the file said.
    pub fn apply_overrides(
        &mut self,
        storage_id: Option<String>,
        compression_format: Option<String>,
        compression_mode: Option<String>,
    ) {
        if let Some(storage_id) = storage_id {
            self.storage_id = storage_id;
        }
        if compression_format.is_some() {
            self.compression_format = compression_format;
        }
        if compression_mode.is_some() {
            self.compression_mode = compression_mode;
        }
    }

    pub fn reindex_options(&self) -> ReindexOptions {
        ReindexOptions {
            storage_id: self.storage_id.clone(),
            compression_format: self.compression_format.clone(),
            compression_mode: self.compression_mode.clone(),
        }
    }
}

pub fn generate_config(path: &Path) -> std::io::Result<()> {
    let config = Config::default();

    let content = format!(
        r#"# bagdex configuration file
# Generated by: bagdex --gen-config {}
#
# Command-line flags take precedence over values in this file.

# Storage format of the recording's segment files.
# "sqlite3" reads <name>_<n>.db3 segments.
storage_id = "{}"

# Compression settings written into rebuilt indexes. When unset, the values
# found in the first segment are kept.
# compression_format = "zstd"
# compression_mode = "file"

# Default log filter when RUST_LOG is not set (e.g. "info", "bagdex=debug").
# log_filter = "warn"
"#,
        path.display(),
        config.storage_id,
    );

    std::fs::write(path, content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.storage_id, "sqlite3");
        assert!(config.compression_format.is_none());
        assert!(config.compression_mode.is_none());
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn test_config_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bagdex.toml");

        let toml_content = r#"
storage_id = "sqlite3"
compression_format = "zstd"
compression_mode = "file"
log_filter = "info"
"#;
        std::fs::write(&config_path, toml_content).unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.compression_format.as_deref(), Some("zstd"));
        assert_eq!(config.compression_mode.as_deref(), Some("file"));
        assert_eq!(config.log_filter.as_deref(), Some("info"));
    }

    #[test]
    fn test_config_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bagdex.json");
        std::fs::write(&config_path, r#"{"storage_id": "mcap"}"#).unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.storage_id, "mcap");
        assert!(config.compression_format.is_none());
    }

    #[test]
    fn test_config_empty_toml_uses_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bagdex.toml");
        std::fs::write(&config_path, "").unwrap();

        assert_eq!(Config::from_file(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_config_unknown_extension() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bagdex.yaml");
        std::fs::write(&config_path, "storage_id: sqlite3").unwrap();

        let result = Config::from_file(&config_path);
        assert!(matches!(result, Err(BagError::Config(_))));
    }

    #[test]
    fn test_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bagdex.toml");
        std::fs::write(&config_path, "storage_id = ").unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = Config {
            compression_format: Some("zstd".into()),
            ..Config::default()
        };

        config.apply_overrides(Some("custom".into()), None, Some("message".into()));

        assert_eq!(config.storage_id, "custom");
        assert_eq!(config.compression_format.as_deref(), Some("zstd"));
        assert_eq!(config.compression_mode.as_deref(), Some("message"));

        let options = config.reindex_options();
        assert_eq!(options.storage_id, "custom");
        assert_eq!(options.compression_mode.as_deref(), Some("message"));
    }

    #[test]
    fn test_generated_config_parses() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bagdex.toml");

        generate_config(&config_path).unwrap();

        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }
}
