//! Command implementations behind the `bagdex` binary.
//!
//! Each command prints a human-readable summary to stdout and returns the
//! underlying error unchanged so `main` can map it to an exit status.

use crate::config::Config;
use bdx_core::{BagError, RecordingMetadata, Result};
use bdx_reindex::{
    ReindexOutcome, ReindexWarning, Reindexer, discover_segments, order_segments,
};
use bdx_storage::{MetadataIo, StorageFactory, YamlMetadataIo};
use std::path::Path;
use tracing::warn;

/// Rebuild the index file of the recording in `dir`.
pub fn reindex_recording(dir: &Path, config: &Config) -> Result<()> {
    let reindexer = Reindexer::with_defaults(config.reindex_options());

    match reindexer.reindex(dir)? {
        ReindexOutcome::Completed(report) => {
            println!("Reindexed: {}", report.directory.display());
            println!("  Index: {}", report.index_path.display());
            print_metadata_summary(&report.metadata);

            for warning in &report.warnings {
                match warning {
                    ReindexWarning::NoTopics { segment } => {
                        println!("  Warning: no topics listed in {}", segment.display());
                    },
                }
            }
        },
        ReindexOutcome::NoSegmentsFound { directory } => {
            println!(
                "No segment files found in: {} (nothing written)",
                directory.display()
            );
        },
    }

    Ok(())
}

/// List the segments of a recording in index order.
pub fn list_segments(dir: &Path, storage_id: &str) -> Result<()> {
    let factory = StorageFactory::with_defaults();

    let paths = discover_segments(dir, factory.segment_extension(storage_id))?;
    if paths.is_empty() {
        return Err(BagError::NoSegmentsFound {
            path: dir.to_path_buf(),
        });
    }

    let segments = order_segments(paths)?;
    let backend = factory.backend(storage_id)?;

    println!("Segments in: {} ({})", dir.display(), backend.storage_id());
    println!("{:<10} {:<40} {:<15}", "ID", "File", "Size");
    println!("{}", "-".repeat(67));

    let mut total = 0u64;
    for segment in &segments {
        let size = segment_size(segment.path());
        total = total.saturating_add(size);
        println!(
            "{:<10} {:<40} {:<15}",
            segment.id,
            segment.file_name(),
            format_size(size)
        );
    }

    println!("{} segment(s), {}", segments.len(), format_size(total));

    Ok(())
}

fn segment_size(path: &Path) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            warn!(
                target: "bagdex::cli",
                path = %path.display(),
                error = %e,
                "Failed to stat segment"
            );
            0
        },
    }
}

/// Summarise the existing index file of a recording.
pub fn show_info(dir: &Path) -> Result<()> {
    let io = YamlMetadataIo;
    if !io.metadata_file_exists(dir) {
        return Err(BagError::Metadata(format!(
            "No index file at {}",
            io.metadata_file_path(dir).display()
        )));
    }

    let metadata = io.read_metadata(dir)?;

    println!("Recording: {}", dir.display());
    print_metadata_summary(&metadata);

    for topic in &metadata.topics_with_message_count {
        println!(
            "    {:<30} {:<35} {:>10} msgs ({})",
            topic.topic_metadata.name,
            topic.topic_metadata.type_name,
            topic.message_count,
            topic.topic_metadata.serialization_format
        );
    }

    Ok(())
}

fn print_metadata_summary(metadata: &RecordingMetadata) {
    println!("  Storage: {}", metadata.storage_identifier);
    println!("  Segments: {}", metadata.relative_file_paths.len());
    for path in &metadata.relative_file_paths {
        println!("    {}", path);
    }
    println!("  Size: {}", format_size(metadata.bag_size));
    println!("  Start: {} ns", metadata.starting_time_ns);
    println!("  Duration: {} ns", metadata.duration_ns);
    println!("  Messages: {}", metadata.message_count);
    println!("  Topics: {}", metadata.topic_count());
    if !metadata.compression_format.is_empty() {
        println!(
            "  Compression: {} ({})",
            metadata.compression_format, metadata.compression_mode
        );
    }
}

/// Format a size in bytes as a human-readable string
fn format_size(bytes: u64) -> String {
    if bytes > 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes > 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
