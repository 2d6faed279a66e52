//! Backup and prune orchestration against a [`SnapshotStore`].
//!
//! The orchestrator is the only part of the crate that performs I/O. Per
//! tagged resource it runs two independent pipelines:
//!
//! ```text
//! backup: list all snapshots -> pending backups -> copy each
//! prune:  list manual snapshots -> RetentionSelector::plan -> delete each
//! ```
//!
//! A failure inside one resource is recorded in that resource's report and
//! never stops the others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backup::BackupIdentifierDeriver;
use crate::config::OrchestratorConfig;
use crate::error::RetentionError;
use crate::identifier::snapshots_from_records;
use crate::selector::RetentionSelector;
use crate::store::SnapshotStore;
use crate::types::{BackupRequest, Resource, ResourceId, RetentionPlan, SnapshotId, SnapshotKind};

/// Error type for orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
    /// Retention computation failed.
    #[error("Retention error: {0}")]
    Retention(#[from] RetentionError),
}

impl OrchestratorError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Outcome of the backup pipeline for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupOutcome {
    /// Copies the pipeline decided on.
    pub planned: Vec<BackupRequest>,
    /// Backups actually created.
    pub created: Vec<SnapshotId>,
    /// Copy failures (`source -> target: error`).
    pub failures: Vec<String>,
}

/// Outcome of the prune pipeline for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneOutcome {
    /// The plan that was applied.
    pub plan: RetentionPlan,
    /// Snapshots actually deleted.
    pub deleted: Vec<SnapshotId>,
    /// Delete failures (`id: error`).
    pub failures: Vec<String>,
}

/// Per-resource section of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    /// Resource id.
    pub resource_id: ResourceId,
    /// Backups planned for the resource.
    pub planned_backups: Vec<BackupRequest>,
    /// Backups created.
    pub backups_created: Vec<SnapshotId>,
    /// Snapshots the plan keeps.
    pub retained: Vec<SnapshotId>,
    /// Snapshots the plan deletes.
    pub planned_deletions: Vec<SnapshotId>,
    /// Snapshots deleted.
    pub snapshots_deleted: Vec<SnapshotId>,
    /// Fingerprint of the applied plan, if pruning got that far.
    pub plan_fingerprint: Option<String>,
    /// Everything that went wrong for this resource.
    pub failures: Vec<String>,
}

impl ResourceReport {
    fn new(resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            planned_backups: Vec::new(),
            backups_created: Vec::new(),
            retained: Vec::new(),
            planned_deletions: Vec::new(),
            snapshots_deleted: Vec::new(),
            plan_fingerprint: None,
            failures: Vec::new(),
        }
    }

    /// True when nothing failed for this resource.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id of the run, also recorded on the run's tracing span.
    pub run_id: Uuid,
    /// Reference instant used for every retention decision in the run.
    pub now: DateTime<Utc>,
    /// Region the store targeted.
    pub region: String,
    /// Whether copies and deletes were suppressed.
    pub dry_run: bool,
    /// One entry per tagged resource, in store order.
    pub resources: Vec<ResourceReport>,
}

impl RunReport {
    /// Number of backups created across resources.
    pub fn total_backups_created(&self) -> usize {
        self.resources.iter().map(|r| r.backups_created.len()).sum()
    }

    /// Number of snapshots deleted across resources.
    pub fn total_deleted(&self) -> usize {
        self.resources.iter().map(|r| r.snapshots_deleted.len()).sum()
    }

    /// Resources with at least one failure.
    pub fn failed_resources(&self) -> Vec<&ResourceId> {
        self.resources
            .iter()
            .filter(|r| !r.is_clean())
            .map(|r| &r.resource_id)
            .collect()
    }
}

/// Drives backups and pruning for every opted-in resource.
pub struct Orchestrator<S: SnapshotStore> {
    store: Arc<S>,
    config: OrchestratorConfig,
    selector: RetentionSelector,
    deriver: BackupIdentifierDeriver,
}

impl<S: SnapshotStore> Orchestrator<S> {
    /// Create an orchestrator over a store.
    pub fn new(store: Arc<S>, config: OrchestratorConfig) -> Self {
        let selector = RetentionSelector::new(config.policy.clone());
        let deriver = config.deriver();
        Self {
            store,
            config,
            selector,
            deriver,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The retention selector.
    pub fn selector(&self) -> &RetentionSelector {
        &self.selector
    }

    /// The backup id deriver.
    pub fn deriver(&self) -> &BackupIdentifierDeriver {
        &self.deriver
    }

    /// Resources carrying the configured backup tag.
    ///
    /// A resource whose tags cannot be read is skipped with a warning.
    pub async fn tagged_resources(&self) -> Result<Vec<Resource>, OrchestratorError> {
        let resources = self
            .store
            .list_resources()
            .await
            .map_err(OrchestratorError::from_store)?;
        debug!(count = resources.len(), "resources listed");

        let mut tagged = Vec::new();
        for resource in resources {
            match self.store.list_tags(&resource).await {
                Ok(tags) if tags.contains(&self.config.backup_tag) => tagged.push(resource),
                Ok(_) => debug!(resource_id = %resource.id, "resource not tagged for backup; skipping"),
                Err(e) => warn!(resource_id = %resource.id, error = %e, "failed to read tags; skipping"),
            }
        }
        Ok(tagged)
    }

    /// Copy every automated snapshot of `resource` that lacks a backup.
    pub async fn back_up(&self, resource: &ResourceId) -> Result<BackupOutcome, OrchestratorError> {
        let records = self
            .store
            .list_snapshots(resource, None)
            .await
            .map_err(OrchestratorError::from_store)?;
        let snapshots = snapshots_from_records(records)?;
        let planned = self.deriver.pending_backups(&snapshots);

        let mut outcome = BackupOutcome {
            planned,
            ..BackupOutcome::default()
        };
        if self.config.dry_run {
            return Ok(outcome);
        }

        for request in &outcome.planned {
            debug!(source = %request.source, target = %request.target, "copying snapshot");
            match self.store.copy_snapshot(&request.source, &request.target).await {
                Ok(created) => {
                    info!(source = %request.source, backup = %created, "backup created");
                    outcome.created.push(created);
                }
                Err(e) => {
                    error!(source = %request.source, target = %request.target, error = %e, "copy failed");
                    outcome
                        .failures
                        .push(format!("{} -> {}: {}", request.source, request.target, e));
                }
            }
        }
        Ok(outcome)
    }

    /// Retention plan for a resource's manual snapshots, without side effects.
    pub async fn preview(
        &self,
        resource: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<RetentionPlan, OrchestratorError> {
        let records = self
            .store
            .list_snapshots(resource, Some(SnapshotKind::Manual))
            .await
            .map_err(OrchestratorError::from_store)?;
        let snapshots = snapshots_from_records(records)?;
        Ok(self.selector.plan(now, &snapshots)?)
    }

    /// Plan retention for `resource` and delete everything outside the retain set.
    pub async fn prune(
        &self,
        resource: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<PruneOutcome, OrchestratorError> {
        let plan = self.preview(resource, now).await?;
        let mut outcome = PruneOutcome {
            plan,
            deleted: Vec::new(),
            failures: Vec::new(),
        };
        if self.config.dry_run {
            return Ok(outcome);
        }

        for snapshot in &outcome.plan.delete {
            match self.store.delete_snapshot(&snapshot.id).await {
                Ok(()) => {
                    debug!(snapshot_id = %snapshot.id, "snapshot deleted");
                    outcome.deleted.push(snapshot.id.clone());
                }
                Err(e) => {
                    error!(snapshot_id = %snapshot.id, error = %e, "delete failed");
                    outcome.failures.push(format!("{}: {}", snapshot.id, e));
                }
            }
        }
        Ok(outcome)
    }

    /// Run both pipelines for every tagged resource.
    ///
    /// Only a failure to list resources aborts the run.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport, OrchestratorError> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "gfs_run",
            run_id = %run_id,
            region = %self.config.region,
            dry_run = self.config.dry_run,
        );

        async move {
            let resources = self.tagged_resources().await?;
            info!(count = resources.len(), %now, "starting backup and prune");

            let mut reports = Vec::with_capacity(resources.len());
            for resource in &resources {
                let span = info_span!("resource", resource_id = %resource.id);
                reports.push(self.run_resource(&resource.id, now).instrument(span).await);
            }

            let report = RunReport {
                run_id,
                now,
                region: self.config.region.clone(),
                dry_run: self.config.dry_run,
                resources: reports,
            };
            info!(
                backups_created = report.total_backups_created(),
                deleted = report.total_deleted(),
                failed_resources = report.failed_resources().len(),
                "run complete"
            );
            Ok::<_, OrchestratorError>(report)
        }
        .instrument(span)
        .await
    }

    async fn run_resource(&self, resource: &ResourceId, now: DateTime<Utc>) -> ResourceReport {
        let mut report = ResourceReport::new(resource.clone());

        match self.back_up(resource).await {
            Ok(outcome) => {
                report.planned_backups = outcome.planned;
                report.backups_created = outcome.created;
                report.failures.extend(outcome.failures);
            }
            Err(e) => {
                error!(error = %e, "backup pipeline failed");
                report.failures.push(format!("backup: {}", e));
            }
        }

        match self.prune(resource, now).await {
            Ok(outcome) => {
                info!(
                    retained = outcome.plan.retain.len(),
                    deleted = outcome.deleted.len(),
                    fingerprint = %outcome.plan.fingerprint,
                    "prune complete"
                );
                report.retained = outcome.plan.retained_ids();
                report.planned_deletions = outcome.plan.deleted_ids();
                report.plan_fingerprint = Some(outcome.plan.fingerprint);
                report.snapshots_deleted = outcome.deleted;
                report.failures.extend(outcome.failures);
            }
            Err(e) => {
                error!(error = %e, "prune pipeline failed; resource skipped");
                report.failures.push(format!("prune: {}", e));
            }
        }

        report
    }
}
