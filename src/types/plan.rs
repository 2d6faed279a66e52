//! Retention plans and backup requests produced by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use super::snapshot::{Snapshot, SnapshotId};

/// Fields hashed into a plan fingerprint.
#[derive(Serialize)]
struct PlanDigest<'a> {
    policy_params_hash: &'a str,
    now: DateTime<Utc>,
    retain: Vec<&'a str>,
    delete: Vec<&'a str>,
}

/// The retain/delete partition of one resource's snapshots.
///
/// `retain` is ordered newest first; `delete` preserves the order of the
/// input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPlan {
    /// Reference instant the plan was computed for.
    pub now: DateTime<Utc>,
    /// Snapshots that survive.
    pub retain: Vec<Snapshot>,
    /// Snapshots to delete.
    pub delete: Vec<Snapshot>,
    /// Hash of the policy that produced the plan.
    pub policy_params_hash: String,
    /// Deterministic fingerprint of (policy, now, retain ids, delete ids).
    pub fingerprint: String,
}

impl RetentionPlan {
    /// Build a plan and compute its fingerprint.
    pub fn new(
        now: DateTime<Utc>,
        retain: Vec<Snapshot>,
        delete: Vec<Snapshot>,
        policy_params_hash: String,
    ) -> Self {
        let fingerprint = {
            let mut retain_ids: Vec<&str> = retain.iter().map(|s| s.id.as_str()).collect();
            let mut delete_ids: Vec<&str> = delete.iter().map(|s| s.id.as_str()).collect();
            retain_ids.sort_unstable();
            delete_ids.sort_unstable();
            canonical_hash_hex(&PlanDigest {
                policy_params_hash: &policy_params_hash,
                now,
                retain: retain_ids,
                delete: delete_ids,
            })
        };

        Self {
            now,
            retain,
            delete,
            policy_params_hash,
            fingerprint,
        }
    }

    /// Ids of retained snapshots, newest first.
    pub fn retained_ids(&self) -> Vec<SnapshotId> {
        self.retain.iter().map(|s| s.id.clone()).collect()
    }

    /// Ids of snapshots to delete.
    pub fn deleted_ids(&self) -> Vec<SnapshotId> {
        self.delete.iter().map(|s| s.id.clone()).collect()
    }

    /// True when nothing needs deleting.
    pub fn is_noop(&self) -> bool {
        self.delete.is_empty()
    }
}

/// A copy to issue: materialize `target` from automated snapshot `source`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BackupRequest {
    /// Automated snapshot to copy.
    pub source: SnapshotId,
    /// Derived id of the long-lived backup.
    pub target: SnapshotId,
}

impl BackupRequest {
    /// Create a backup request.
    pub fn new(source: SnapshotId, target: SnapshotId) -> Self {
        Self { source, target }
    }
}
