//! # gfs-retention
//!
//! Grandfather-father-son retention for periodic snapshots.
//!
//! The crate answers one question:
//!
//! > Given every snapshot a resource has today, which ones are **worth keeping**?
//!
//! ## Core Contract
//!
//! 1. Recent history is kept at daily granularity
//! 2. Medium-term history is kept at weekly granularity
//! 3. Everything older collapses to one snapshot per calendar month, forever
//!
//! ## Architecture
//!
//! ```text
//! Snapshots → RetentionSelector → retain → difference → delete
//!                    ↓
//!            BoundaryGenerator (GfsPolicy)
//!
//! Automated snapshots → BackupIdentifierDeriver → BackupRequests
//!
//! Orchestrator drives both against a SnapshotStore
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same `now` + same policy + same snapshots → identical plan fingerprint
//! - Creation-time ties are broken by snapshot id
//! - The core never reads the wall clock
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use gfs_retention::{RetentionSelector, Snapshot};
//!
//! let now = Utc.with_ymd_and_hms(2020, 3, 10, 12, 0, 0).unwrap();
//! let snapshots = vec![
//!     Snapshot::manual("morning", Utc.with_ymd_and_hms(2020, 3, 10, 6, 0, 0).unwrap()),
//!     Snapshot::manual("night", Utc.with_ymd_and_hms(2020, 3, 9, 23, 0, 0).unwrap()),
//!     Snapshot::manual("evening", Utc.with_ymd_and_hms(2020, 3, 9, 18, 0, 0).unwrap()),
//! ];
//!
//! let plan = RetentionSelector::default().plan(now, &snapshots).unwrap();
//! assert_eq!(plan.retain.len(), 2);
//! assert_eq!(plan.delete[0].id.as_str(), "night");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod boundaries;
pub mod selector;
pub mod difference;
pub mod backup;
pub mod identifier;
pub mod canonical;
pub mod error;
pub mod store;
pub mod config;
pub mod orchestrator;
pub mod simulator;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    Snapshot, SnapshotId, SnapshotKind, SnapshotRecord, Resource, ResourceId, Tag,
    RetentionBoundary, Granularity, RetentionPlan, BackupRequest,
};
pub use policy::{GfsPolicy, DEFAULT_DAILY_COUNT, DEFAULT_WEEKLY_COUNT, DEFAULT_WEEK_START};
pub use boundaries::BoundaryGenerator;
pub use selector::RetentionSelector;
pub use difference::{difference, difference_by_key};
pub use backup::{BackupIdentifierDeriver, DEFAULT_BACKUP_SUFFIX, DEFAULT_SOURCE_PREFIX};
pub use identifier::{snapshots_from_records, timestamp_from_identifier};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use error::RetentionError;
pub use store::{SnapshotStore, InMemorySnapshotStore, InMemoryStoreError, CatalogFixture};
pub use config::{ConfigError, OrchestratorConfig};
pub use orchestrator::{Orchestrator, OrchestratorError, RunReport, ResourceReport};
pub use simulator::RetentionSimulator;

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Schema version for serialized plans and run reports.
/// Increment on breaking changes to any schema type.
pub const RETENTION_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "gfs_policy_v1";
