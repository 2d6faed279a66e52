//! Deterministic GFS retention selector.
//!
//! The selector walks a resource's snapshots from newest to oldest while
//! pulling boundaries from a [`BoundaryGenerator`], keeping exactly one
//! snapshot per crossed bucket.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::difference::difference;
use crate::error::RetentionError;
use crate::policy::GfsPolicy;
use crate::types::{RetentionPlan, Snapshot};

/// Deterministic retention selector.
///
/// ## Algorithm
///
/// 1. Sort snapshots by creation time, newest first (ties by id ascending)
/// 2. Start with `kept = newest` and `cursor = first boundary`
/// 3. For each older snapshot:
///    - same day as `cursor` or later: it replaces `kept`
///    - older: emit `kept`, draw the next boundary, and start over with it
/// 4. Emit the final `kept` (the oldest snapshot)
///
/// ## Sparse history
///
/// Only one boundary is drawn per crossing snapshot, even when the gap to
/// that snapshot spans several buckets. Resources with gaps in their history
/// therefore keep more snapshots in older buckets than a strict
/// one-per-bucket reading would suggest.
#[derive(Debug, Clone, Default)]
pub struct RetentionSelector {
    policy: GfsPolicy,
}

impl RetentionSelector {
    /// Create a selector for a policy.
    pub fn new(policy: GfsPolicy) -> Self {
        Self { policy }
    }

    /// The policy this selector applies.
    pub fn policy(&self) -> &GfsPolicy {
        &self.policy
    }

    /// Select the snapshots to retain, newest first.
    ///
    /// Empty input yields an empty retain set. Duplicate `(created_at, id)`
    /// pairs fail with [`RetentionError::NonDeterministicOrdering`].
    pub fn select(
        &self,
        now: DateTime<Utc>,
        snapshots: &[Snapshot],
    ) -> Result<Vec<Snapshot>, RetentionError> {
        let mut sorted: Vec<&Snapshot> = snapshots.iter().collect();
        sorted.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        if let Some(pair) = sorted
            .windows(2)
            .find(|w| w[0].created_at == w[1].created_at && w[0].id == w[1].id)
        {
            return Err(RetentionError::NonDeterministicOrdering {
                snapshot_id: pair[0].id.clone(),
                created_at: pair[0].created_at,
            });
        }

        let Some((&newest, older)) = sorted.split_first() else {
            return Ok(Vec::new());
        };

        let mut boundaries = self.policy.boundaries(now);
        let mut cursor = boundaries.next();
        let mut kept = newest;
        let mut retained = Vec::new();

        for &candidate in older {
            let inside = cursor.map_or(true, |b| b.admits(candidate.created_at));
            if inside {
                kept = candidate;
            } else {
                retained.push(kept.clone());
                cursor = boundaries.next();
                kept = candidate;
            }
        }
        retained.push(kept.clone());

        Ok(retained)
    }

    /// Compute the full retain/delete partition for one resource.
    pub fn plan(
        &self,
        now: DateTime<Utc>,
        snapshots: &[Snapshot],
    ) -> Result<RetentionPlan, RetentionError> {
        let retain = self.select(now, snapshots)?;
        let delete = difference(snapshots, &retain);

        debug!(
            total = snapshots.len(),
            retained = retain.len(),
            deleted = delete.len(),
            "retention plan computed"
        );

        Ok(RetentionPlan::new(now, retain, delete, self.policy.params_hash()))
    }
}
