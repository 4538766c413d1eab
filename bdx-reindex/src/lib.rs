#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod discovery;
mod finalize;
mod ordering;
mod reconcile;
mod recovery;
mod reindexer;

pub use discovery::discover_segments;
pub use finalize::finalize_metadata;
pub use ordering::{order_segments, segment_id};
pub use reconcile::{ReindexOptions, reconcile_metadata, topics_metadata};
pub use recovery::{RecoveredSnapshot, recover_metadata};
pub use reindexer::{ReindexOutcome, ReindexReport, ReindexStage, ReindexWarning, Reindexer};
