//! Errors raised by the retention core.

use chrono::{DateTime, Utc};

use crate::types::SnapshotId;

/// Error type for retention computations.
///
/// An empty snapshot list is not an error: selection returns an empty
/// retain set. Every variant here means the resource's snapshots cannot be
/// pruned safely and the caller should skip the resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetentionError {
    /// A snapshot has no usable creation time.
    #[error("Malformed timestamp for snapshot {snapshot_id}: {detail}")]
    MalformedTimestamp {
        /// Offending snapshot.
        snapshot_id: SnapshotId,
        /// What could not be parsed.
        detail: String,
    },
    /// Two snapshots share both creation time and id.
    #[error("Duplicate snapshot {snapshot_id} at {created_at}: ordering is not deterministic")]
    NonDeterministicOrdering {
        /// Duplicated snapshot id.
        snapshot_id: SnapshotId,
        /// Shared creation instant.
        created_at: DateTime<Utc>,
    },
}

impl RetentionError {
    /// Create a malformed timestamp error.
    pub fn malformed(snapshot_id: &SnapshotId, detail: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            snapshot_id: snapshot_id.clone(),
            detail: detail.into(),
        }
    }
}
