//! Backup identifier derivation.
//!
//! Automated snapshots are short-lived: the storage service expires them on
//! its own schedule. Each one is copied into a manual snapshot whose id is
//! derived from the source id, so a re-run can tell which copies exist.

use std::collections::{BTreeSet, HashSet};

use crate::types::{BackupRequest, Snapshot, SnapshotId, SnapshotKind};

/// Prefix token carried by automated snapshot ids.
pub const DEFAULT_SOURCE_PREFIX: &str = "rds:";

/// Suffix token appended to derived backup ids.
pub const DEFAULT_BACKUP_SUFFIX: &str = "-backup";

/// Derives backup ids from automated snapshot ids.
///
/// `derive_target_id` splits the source id on the prefix token, drops the
/// segment before the first occurrence, joins the rest with `-`, and appends
/// the suffix: `rds:orders-2020-03-10-05-00` becomes
/// `orders-2020-03-10-05-00-backup`.
///
/// An id without the prefix token has no segments after the split and
/// derives to the bare suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupIdentifierDeriver {
    source_prefix: String,
    backup_suffix: String,
}

impl BackupIdentifierDeriver {
    /// Create a deriver with custom tokens.
    pub fn new(source_prefix: impl Into<String>, backup_suffix: impl Into<String>) -> Self {
        Self {
            source_prefix: source_prefix.into(),
            backup_suffix: backup_suffix.into(),
        }
    }

    /// Prefix token stripped from source ids.
    pub fn source_prefix(&self) -> &str {
        &self.source_prefix
    }

    /// Suffix token appended to backup ids.
    pub fn backup_suffix(&self) -> &str {
        &self.backup_suffix
    }

    /// Deterministic backup id for an automated snapshot id.
    pub fn derive_target_id(&self, source_id: &SnapshotId) -> SnapshotId {
        let segments: Vec<&str> = if self.source_prefix.is_empty() {
            vec![source_id.as_str()]
        } else {
            source_id.as_str().split(self.source_prefix.as_str()).skip(1).collect()
        };
        SnapshotId::new(format!("{}{}", segments.join("-"), self.backup_suffix))
    }

    /// Whether `source` is automated and its backup is not yet among `existing_manual_ids`.
    pub fn needs_backup(&self, source: &Snapshot, existing_manual_ids: &HashSet<SnapshotId>) -> bool {
        source.kind == SnapshotKind::Automated
            && !existing_manual_ids.contains(&self.derive_target_id(&source.id))
    }

    /// Copies required for a resource's full snapshot listing.
    ///
    /// Requests follow the order of `snapshots`; a target derived twice is
    /// requested once.
    pub fn pending_backups(&self, snapshots: &[Snapshot]) -> Vec<BackupRequest> {
        let manual_ids: HashSet<SnapshotId> = snapshots
            .iter()
            .filter(|s| s.kind == SnapshotKind::Manual)
            .map(|s| s.id.clone())
            .collect();

        let mut seen = BTreeSet::new();
        snapshots
            .iter()
            .filter(|s| self.needs_backup(s, &manual_ids))
            .map(|s| BackupRequest::new(s.id.clone(), self.derive_target_id(&s.id)))
            .filter(|request| seen.insert(request.target.clone()))
            .collect()
    }
}

impl Default for BackupIdentifierDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_PREFIX, DEFAULT_BACKUP_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn id(s: &str) -> SnapshotId {
        SnapshotId::from(s)
    }

    #[test]
    fn test_derive_strips_prefix_and_appends_suffix() {
        let deriver = BackupIdentifierDeriver::default();
        assert_eq!(
            deriver.derive_target_id(&id("rds:orders-2020-03-10-05-00")),
            id("orders-2020-03-10-05-00-backup")
        );
    }

    #[test]
    fn test_derive_joins_repeated_prefix_segments() {
        let deriver = BackupIdentifierDeriver::default();
        assert_eq!(deriver.derive_target_id(&id("rds:a-rds:b")), id("a--b-backup"));
    }

    #[test]
    fn test_derive_without_prefix() {
        let deriver = BackupIdentifierDeriver::default();
        assert_eq!(deriver.derive_target_id(&id("orders-manual")), id("-backup"));

        let no_prefix = BackupIdentifierDeriver::new("", "-copy");
        assert_eq!(no_prefix.derive_target_id(&id("orders")), id("orders-copy"));
    }

    #[test]
    fn test_derive_is_deterministic() {
        let deriver = BackupIdentifierDeriver::default();
        let source = id("rds:orders-2020-03-10-05-00");
        assert_eq!(deriver.derive_target_id(&source), deriver.derive_target_id(&source));
    }

    #[test]
    fn test_needs_backup() {
        let deriver = BackupIdentifierDeriver::default();
        let t = Utc.with_ymd_and_hms(2020, 3, 10, 5, 0, 0).unwrap();
        let auto = Snapshot::automated("rds:orders-2020-03-10-05-00", t);
        let manual = Snapshot::manual("orders-2020-03-10-05-00-backup", t);

        let mut existing = HashSet::new();
        assert!(deriver.needs_backup(&auto, &existing));
        assert!(!deriver.needs_backup(&manual, &existing));

        existing.insert(manual.id.clone());
        assert!(!deriver.needs_backup(&auto, &existing));
    }

    #[test]
    fn test_pending_backups() {
        let deriver = BackupIdentifierDeriver::default();
        let t1 = Utc.with_ymd_and_hms(2020, 3, 9, 5, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2020, 3, 10, 5, 0, 0).unwrap();
        let snapshots = vec![
            Snapshot::automated("rds:orders-2020-03-09-05-00", t1),
            Snapshot::automated("rds:orders-2020-03-10-05-00", t2),
            Snapshot::manual("orders-2020-03-09-05-00-backup", t1),
        ];

        let pending = deriver.pending_backups(&snapshots);
        assert_eq!(
            pending,
            vec![BackupRequest::new(
                id("rds:orders-2020-03-10-05-00"),
                id("orders-2020-03-10-05-00-backup"),
            )]
        );
    }

    #[test]
    fn test_pending_backups_dedupes_targets() {
        let deriver = BackupIdentifierDeriver::default();
        let t = Utc.with_ymd_and_hms(2020, 3, 10, 5, 0, 0).unwrap();
        let snapshots = vec![Snapshot::automated("plain-a", t), Snapshot::automated("plain-b", t)];

        let pending = deriver.pending_backups(&snapshots);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target, id("-backup"));
    }
}
