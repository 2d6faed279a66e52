//! Core types for the retention engine.

pub mod snapshot;
pub mod boundary;
pub mod plan;

pub use snapshot::{Snapshot, SnapshotId, SnapshotKind, SnapshotRecord, Resource, ResourceId, Tag};
pub use boundary::{RetentionBoundary, Granularity};
pub use plan::{RetentionPlan, BackupRequest};
