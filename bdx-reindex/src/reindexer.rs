use crate::discovery::discover_segments;
use crate::finalize::finalize_metadata;
use crate::ordering::order_segments;
use crate::reconcile::{ReindexOptions, reconcile_metadata, topics_metadata};
use crate::recovery::recover_metadata;
use bdx_core::{ErrorKind, RecordingMetadata, Result, TopicMetadata};
use bdx_storage::{MetadataIo, StorageFactory, YamlMetadataIo};
use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Progress of a reindex run. Every run starts at `Idle` and ends in either
/// `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReindexStage {
    #[default]
    Idle,
    Discovering,
    Ordering,
    Recovering,
    Reconciling,
    Finalizing,
    Persisting,
    Done,
    Failed(ErrorKind),
}

impl ReindexStage {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for ReindexStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Discovering => write!(f, "discovering"),
            Self::Ordering => write!(f, "ordering"),
            Self::Recovering => write!(f, "recovering"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Persisting => write!(f, "persisting"),
            Self::Done => write!(f, "done"),
            Self::Failed(kind) => write!(f, "failed({kind:?})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexWarning {
    /// The recovered snapshot listed no topics.
    NoTopics { segment: PathBuf },
}

#[derive(Debug, Clone)]
pub struct ReindexReport {
    pub directory: PathBuf,
    /// The metadata handed to the persister.
    pub metadata: RecordingMetadata,
    /// Topic identities of `metadata`, without counts. Not persisted.
    pub topics_metadata: Vec<TopicMetadata>,
    pub index_path: PathBuf,
    /// Segment the metadata snapshot was read from.
    pub snapshot_source: PathBuf,
    pub warnings: Vec<ReindexWarning>,
}

#[derive(Debug, Clone)]
pub enum ReindexOutcome {
    Completed(Box<ReindexReport>),
    /// The directory holds no segments; nothing was written.
    NoSegmentsFound { directory: PathBuf },
}

impl ReindexOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&ReindexReport> {
        match self {
            Self::Completed(report) => Some(report.as_ref()),
            Self::NoSegmentsFound { .. } => None,
        }
    }
}

/// Rebuilds the index file of a recording from its segment files.
///
/// One run is strictly sequential: discover, order, recover a snapshot from
/// the first segment, reconcile the segment list, recompute the size, and
/// persist. Any failure ends the run; nothing is retried and nothing is
/// written unless every earlier step succeeded.
pub struct Reindexer {
    factory: StorageFactory,
    metadata_io: Box<dyn MetadataIo>,
    options: ReindexOptions,
    stage: Cell<ReindexStage>,
}

impl Reindexer {
    pub fn new(
        factory: StorageFactory,
        metadata_io: Box<dyn MetadataIo>,
        options: ReindexOptions,
    ) -> Self {
        Self {
            factory,
            metadata_io,
            options,
            stage: Cell::new(ReindexStage::Idle),
        }
    }

    /// Reindexer using the bundled storage backends and the YAML index.
    #[must_use]
    pub fn with_defaults(options: ReindexOptions) -> Self {
        Self::new(StorageFactory::with_defaults(), Box::new(YamlMetadataIo), options)
    }

    /// Stage reached by the most recent run.
    pub fn stage(&self) -> ReindexStage {
        self.stage.get()
    }

    pub fn options(&self) -> &ReindexOptions {
        &self.options
    }

    /// Rebuild the index of the recording in `dir`.
    ///
    /// An empty directory is not an error: the run stops with
    /// [`ReindexOutcome::NoSegmentsFound`] and leaves any existing index
    /// untouched.
    ///
    /// # Errors
    /// Returns the first error of any step, unchanged.
    pub fn reindex(&self, dir: &Path) -> Result<ReindexOutcome> {
        self.stage.set(ReindexStage::Idle);

        info!(
            target: "bagdex::reindex",
            dir = %dir.display(),
            storage_id = %self.options.storage_id,
            "Beginning reindex"
        );

        match self.run(dir) {
            Ok(outcome) => {
                self.transition(ReindexStage::Done);
                Ok(outcome)
            },
            Err(e) => {
                self.transition(ReindexStage::Failed(e.kind()));
                error!(
                    target: "bagdex::reindex",
                    dir = %dir.display(),
                    error = %e,
                    "Reindex failed"
                );
                Err(e)
            },
        }
    }

    fn transition(&self, next: ReindexStage) {
        let previous = self.stage.replace(next);
        debug!(
            target: "bagdex::reindex",
            from = %previous,
            to = %next,
            "Reindex stage transition"
        );
    }

    fn run(&self, dir: &Path) -> Result<ReindexOutcome> {
        self.transition(ReindexStage::Discovering);
        let extension = self.factory.segment_extension(&self.options.storage_id);
        let paths = discover_segments(dir, extension)?;

        if paths.is_empty() {
            warn!(
                target: "bagdex::reindex",
                dir = %dir.display(),
                extension,
                "No segment files found for reindexing, nothing written"
            );
            return Ok(ReindexOutcome::NoSegmentsFound {
                directory: dir.to_path_buf(),
            });
        }

        self.transition(ReindexStage::Ordering);
        let segments = order_segments(paths)?;

        self.transition(ReindexStage::Recovering);
        let backend = self.factory.backend(&self.options.storage_id)?;
        let Some(first) = segments.first() else {
            return Ok(ReindexOutcome::NoSegmentsFound {
                directory: dir.to_path_buf(),
            });
        };
        let snapshot = recover_metadata(backend, first)?;

        let mut warnings = Vec::new();
        if !snapshot.has_topics() {
            warnings.push(ReindexWarning::NoTopics {
                segment: snapshot.source.clone(),
            });
        }

        self.transition(ReindexStage::Reconciling);
        let mut metadata = snapshot.metadata;
        reconcile_metadata(&mut metadata, &segments, &self.options);
        let topics = topics_metadata(&metadata);

        self.transition(ReindexStage::Finalizing);
        finalize_metadata(dir, &mut metadata);

        self.transition(ReindexStage::Persisting);
        self.metadata_io.write_metadata(dir, &metadata)?;

        let index_path = self.metadata_io.metadata_file_path(dir);
        info!(
            target: "bagdex::reindex",
            dir = %dir.display(),
            index = %index_path.display(),
            segments = metadata.relative_file_paths.len(),
            topics = topics.len(),
            bag_size = metadata.bag_size,
            "Reindex complete"
        );

        Ok(ReindexOutcome::Completed(Box::new(ReindexReport {
            directory: dir.to_path_buf(),
            metadata,
            topics_metadata: topics,
            index_path,
            snapshot_source: snapshot.source,
            warnings,
        })))
    }
}
