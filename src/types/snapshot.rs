//! Snapshot and resource types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a snapshot, unique within its resource.
///
/// Ordered lexicographically; the selector uses this order to break
/// creation-time ties deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Create a snapshot id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SnapshotId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a resource that owns snapshots (e.g. a database instance).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create a resource id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a snapshot came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Short-lived snapshot taken by the storage service on its own schedule.
    Automated,
    /// Long-lived snapshot, including backups copied from automated ones.
    Manual,
}

impl SnapshotKind {
    /// Parse kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "automated" => Some(Self::Automated),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automated => write!(f, "automated"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A point-in-time snapshot with a typed creation instant.
///
/// Identity is the `id`; two snapshots with the same id are the same
/// snapshot regardless of the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// Creation instant (UTC).
    pub created_at: DateTime<Utc>,
    /// Automated or manual.
    pub kind: SnapshotKind,
}

impl Snapshot {
    /// Create a snapshot.
    pub fn new(id: impl Into<SnapshotId>, created_at: DateTime<Utc>, kind: SnapshotKind) -> Self {
        Self {
            id: id.into(),
            created_at,
            kind,
        }
    }

    /// Create a manual snapshot.
    pub fn manual(id: impl Into<SnapshotId>, created_at: DateTime<Utc>) -> Self {
        Self::new(id, created_at, SnapshotKind::Manual)
    }

    /// Create an automated snapshot.
    pub fn automated(id: impl Into<SnapshotId>, created_at: DateTime<Utc>) -> Self {
        Self::new(id, created_at, SnapshotKind::Automated)
    }

    /// Calendar day (UTC) the snapshot was created on.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// A snapshot row as listed by the external storage service.
///
/// `create_time` is absent while the service is still creating the
/// snapshot; see [`crate::identifier`] for the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// Automated or manual.
    pub kind: SnapshotKind,
    /// Creation instant reported by the service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

impl SnapshotRecord {
    /// Create a record with a known creation time.
    pub fn new(id: impl Into<SnapshotId>, kind: SnapshotKind, create_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            create_time: Some(create_time),
        }
    }

    /// Create a record whose creation time has not been reported yet.
    pub fn pending(id: impl Into<SnapshotId>, kind: SnapshotKind) -> Self {
        Self {
            id: id.into(),
            kind,
            create_time: None,
        }
    }
}

impl From<&Snapshot> for SnapshotRecord {
    fn from(snapshot: &Snapshot) -> Self {
        Self::new(snapshot.id.clone(), snapshot.kind, snapshot.created_at)
    }
}

/// A resource whose snapshots are managed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier.
    pub id: ResourceId,
    /// Fully qualified name used for tag lookups.
    pub arn: String,
}

impl Resource {
    /// Create a resource.
    pub fn new(id: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(id),
            arn: arn.into(),
        }
    }
}

/// A key/value tag attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
