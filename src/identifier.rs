//! Adapter from raw service records to typed snapshots.
//!
//! Snapshot ids produced by the storage service embed their creation time
//! as `YYYY-MM-DD-HH-MM` (`rds:orders-2020-03-10-05-00`). The service also
//! reports a creation time, except while a snapshot is still being created;
//! the embedded timestamp covers that gap.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex_lite::Regex;

use crate::error::RetentionError;
use crate::types::{Snapshot, SnapshotId, SnapshotRecord};

const IDENTIFIER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M";

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}-[0-9]{2}-[0-9]{2}").expect("static timestamp pattern")
    })
}

/// Extract the UTC creation time embedded in a snapshot id.
///
/// The first `YYYY-MM-DD-HH-MM` token wins. A missing token or an
/// out-of-range date fails with [`RetentionError::MalformedTimestamp`].
pub fn timestamp_from_identifier(id: &SnapshotId) -> Result<DateTime<Utc>, RetentionError> {
    let token = timestamp_pattern()
        .find(id.as_str())
        .ok_or_else(|| RetentionError::malformed(id, "no YYYY-MM-DD-HH-MM timestamp in identifier"))?;

    let naive = NaiveDateTime::parse_from_str(token.as_str(), IDENTIFIER_TIMESTAMP_FORMAT)
        .map_err(|e| RetentionError::malformed(id, format!("invalid timestamp '{}': {}", token.as_str(), e)))?;

    Ok(Utc.from_utc_datetime(&naive))
}

impl TryFrom<SnapshotRecord> for Snapshot {
    type Error = RetentionError;

    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        let created_at = match record.create_time {
            Some(at) => at,
            None => timestamp_from_identifier(&record.id)?,
        };
        Ok(Snapshot::new(record.id, created_at, record.kind))
    }
}

/// Convert a full listing, failing on the first unusable record.
pub fn snapshots_from_records(records: Vec<SnapshotRecord>) -> Result<Vec<Snapshot>, RetentionError> {
    records.into_iter().map(Snapshot::try_from).collect()
}
