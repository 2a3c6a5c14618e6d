pub mod snapshot_source;
pub mod coordinator;
pub mod tracker;

pub use snapshot_source::{SnapshotSource, TriggeredSnapshot, DEFAULT_MIN_CHECK_INTERVAL};
pub use coordinator::ExecutionCoordinator;
pub use tracker::{MirrorTracker, PassReport};
