//! In-memory snapshot store for tests, simulations, and dry runs.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{Resource, ResourceId, SnapshotId, SnapshotKind, SnapshotRecord, Tag};
use super::SnapshotStore;

/// Error type for in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemoryStoreError {
    /// Resource not found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),
    /// Snapshot not found.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),
    /// Copy target already exists.
    #[error("Snapshot already exists: {0}")]
    SnapshotAlreadyExists(SnapshotId),
    /// Failure injected by a test.
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// One resource in a serialized catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFixture {
    /// Resource id.
    pub id: String,
    /// Fully qualified name; derived from the region when absent.
    #[serde(default)]
    pub arn: Option<String>,
    /// Resource tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Existing snapshots.
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
}

/// Serialized catalog used to seed an [`InMemorySnapshotStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFixture {
    /// Resources in the catalog.
    pub resources: Vec<ResourceFixture>,
}

#[derive(Debug, Default)]
struct Catalog {
    resources: BTreeMap<ResourceId, Resource>,
    tags: BTreeMap<ResourceId, Vec<Tag>>,
    /// Snapshot id -> (owning resource, record).
    snapshots: BTreeMap<SnapshotId, (ResourceId, SnapshotRecord)>,
    failing_listings: BTreeSet<ResourceId>,
    failing_deletes: BTreeSet<SnapshotId>,
}

/// In-memory snapshot store.
///
/// Uses BTreeMap for deterministic listing order and an `RwLock` so copy and
/// delete work through the shared `&self` interface.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    region: String,
    catalog: RwLock<Catalog>,
}

impl InMemorySnapshotStore {
    /// Create an empty store for a region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            catalog: RwLock::new(Catalog::default()),
        }
    }

    /// Create a store seeded from a catalog fixture.
    pub fn from_fixture(region: impl Into<String>, fixture: CatalogFixture) -> Self {
        let store = Self::new(region);
        for resource in fixture.resources {
            let arn = resource
                .arn
                .unwrap_or_else(|| store.default_arn(&resource.id));
            store.add_resource(Resource::new(resource.id.clone(), arn), resource.tags);
            let resource_id = ResourceId::new(resource.id);
            for record in resource.snapshots {
                store.add_snapshot(&resource_id, record);
            }
        }
        store
    }

    /// Parse a JSON catalog fixture and seed a store from it.
    pub fn from_json(region: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let fixture: CatalogFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(region, fixture))
    }

    /// Region the store serves.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Name a resource would get in this region.
    pub fn default_arn(&self, resource_id: &str) -> String {
        format!("arn:aws:rds:{}:000000000000:db:{}", self.region, resource_id)
    }

    /// Add (or replace) a resource and its tags.
    pub fn add_resource(&self, resource: Resource, tags: Vec<Tag>) {
        let mut catalog = self.catalog.write();
        catalog.tags.insert(resource.id.clone(), tags);
        catalog.resources.insert(resource.id.clone(), resource);
    }

    /// Add (or replace) a snapshot owned by `resource`.
    pub fn add_snapshot(&self, resource: &ResourceId, record: SnapshotRecord) {
        self.catalog
            .write()
            .snapshots
            .insert(record.id.clone(), (resource.clone(), record));
    }

    /// Make every snapshot listing for `resource` fail.
    pub fn fail_listing_for(&self, resource: &ResourceId) {
        self.catalog.write().failing_listings.insert(resource.clone());
    }

    /// Make deleting `snapshot` fail.
    pub fn fail_delete_of(&self, snapshot: &SnapshotId) {
        self.catalog.write().failing_deletes.insert(snapshot.clone());
    }

    /// Whether a snapshot exists.
    pub fn contains(&self, snapshot: &SnapshotId) -> bool {
        self.catalog.read().snapshots.contains_key(snapshot)
    }

    /// Ids of a resource's snapshots, in id order.
    pub fn snapshot_ids(&self, resource: &ResourceId) -> Vec<SnapshotId> {
        self.catalog
            .read()
            .snapshots
            .iter()
            .filter(|(_, (owner, _))| owner == resource)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Total number of snapshots across all resources.
    pub fn num_snapshots(&self) -> usize {
        self.catalog.read().snapshots.len()
    }

    /// Number of resources.
    pub fn num_resources(&self) -> usize {
        self.catalog.read().resources.len()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    type Error = InMemoryStoreError;

    async fn list_resources(&self) -> Result<Vec<Resource>, Self::Error> {
        Ok(self.catalog.read().resources.values().cloned().collect())
    }

    async fn list_tags(&self, resource: &Resource) -> Result<Vec<Tag>, Self::Error> {
        self.catalog
            .read()
            .tags
            .get(&resource.id)
            .cloned()
            .ok_or_else(|| InMemoryStoreError::ResourceNotFound(resource.id.clone()))
    }

    async fn list_snapshots(
        &self,
        resource: &ResourceId,
        kind: Option<SnapshotKind>,
    ) -> Result<Vec<SnapshotRecord>, Self::Error> {
        let catalog = self.catalog.read();
        if catalog.failing_listings.contains(resource) {
            return Err(InMemoryStoreError::Injected(format!("listing {}", resource)));
        }
        if !catalog.resources.contains_key(resource) {
            return Err(InMemoryStoreError::ResourceNotFound(resource.clone()));
        }

        Ok(catalog
            .snapshots
            .values()
            .filter(|(owner, record)| owner == resource && kind.map_or(true, |k| record.kind == k))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn copy_snapshot(
        &self,
        source: &SnapshotId,
        target: &SnapshotId,
    ) -> Result<SnapshotId, Self::Error> {
        let mut catalog = self.catalog.write();
        if catalog.snapshots.contains_key(target) {
            return Err(InMemoryStoreError::SnapshotAlreadyExists(target.clone()));
        }
        let (owner, record) = catalog
            .snapshots
            .get(source)
            .cloned()
            .ok_or_else(|| InMemoryStoreError::SnapshotNotFound(source.clone()))?;

        let copy = SnapshotRecord {
            id: target.clone(),
            kind: SnapshotKind::Manual,
            create_time: record.create_time,
        };
        catalog.snapshots.insert(target.clone(), (owner, copy));
        Ok(target.clone())
    }

    async fn delete_snapshot(&self, id: &SnapshotId) -> Result<(), Self::Error> {
        let mut catalog = self.catalog.write();
        if catalog.failing_deletes.contains(id) {
            return Err(InMemoryStoreError::Injected(format!("deleting {}", id)));
        }
        catalog
            .snapshots
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| InMemoryStoreError::SnapshotNotFound(id.clone()))
    }
}
