//! Snapshot storage backends.
//!
//! The store is the orchestrator's only I/O seam: every call is a plain
//! request/response against the external storage-management service.
//! Retries and backoff belong to the implementation, not to callers.

pub mod memory;

use async_trait::async_trait;
use crate::types::{Resource, ResourceId, SnapshotId, SnapshotKind, SnapshotRecord, Tag};

/// Trait for snapshot storage backends.
///
/// Implementations must return listings in a stable order.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// List every resource visible in the configured region.
    async fn list_resources(&self) -> Result<Vec<Resource>, Self::Error>;

    /// List the tags attached to a resource.
    async fn list_tags(&self, resource: &Resource) -> Result<Vec<Tag>, Self::Error>;

    /// List a resource's snapshots, optionally restricted to one kind.
    async fn list_snapshots(
        &self,
        resource: &ResourceId,
        kind: Option<SnapshotKind>,
    ) -> Result<Vec<SnapshotRecord>, Self::Error>;

    /// Copy `source` into a new manual snapshot named `target`.
    ///
    /// Returns the id of the created snapshot.
    async fn copy_snapshot(
        &self,
        source: &SnapshotId,
        target: &SnapshotId,
    ) -> Result<SnapshotId, Self::Error>;

    /// Delete a snapshot.
    async fn delete_snapshot(&self, id: &SnapshotId) -> Result<(), Self::Error>;
}

pub use memory::{CatalogFixture, InMemorySnapshotStore, InMemoryStoreError, ResourceFixture};
