//! Orchestrator configuration.
//!
//! Configuration is an explicit value handed to the orchestrator and store
//! constructors. Nothing reads or mutates process-wide client settings.

use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::backup::{BackupIdentifierDeriver, DEFAULT_BACKUP_SUFFIX, DEFAULT_SOURCE_PREFIX};
use crate::policy::{GfsPolicy, DEFAULT_DAILY_COUNT, DEFAULT_WEEKLY_COUNT, DEFAULT_WEEK_START};
use crate::types::Tag;

/// Default region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default opt-in tag key.
pub const DEFAULT_BACKUP_TAG_KEY: &str = "cj:backup";

/// Default opt-in tag value.
pub const DEFAULT_BACKUP_TAG_VALUE: &str = "true";

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Configuration for one orchestrator.
///
/// ## Environment variables
///
/// - `GFS_REGION`: region the store targets (default: us-east-1)
/// - `GFS_BACKUP_TAG_KEY` / `GFS_BACKUP_TAG_VALUE`: opt-in tag (default: cj:backup=true)
/// - `GFS_DAILY_COUNT`: daily tier length (default: 35)
/// - `GFS_WEEKLY_COUNT`: weekly tier length (default: 24)
/// - `GFS_WEEK_START`: first day of the week (default: sun)
/// - `GFS_SOURCE_PREFIX`: automated id prefix token (default: rds:)
/// - `GFS_BACKUP_SUFFIX`: backup id suffix token (default: -backup)
/// - `GFS_DRY_RUN`: plan without copying or deleting (default: false)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Region the store client targets.
    pub region: String,
    /// Tag that opts a resource into backup management.
    pub backup_tag: Tag,
    /// Retention policy.
    pub policy: GfsPolicy,
    /// Prefix token of automated snapshot ids.
    pub source_prefix: String,
    /// Suffix token of derived backup ids.
    pub backup_suffix: String,
    /// Compute plans without issuing copies or deletes.
    pub dry_run: bool,
}

impl OrchestratorConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults; set but invalid ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let daily_count = parse_var(&lookup, "GFS_DAILY_COUNT")?.unwrap_or(DEFAULT_DAILY_COUNT);
        let weekly_count = parse_var(&lookup, "GFS_WEEKLY_COUNT")?.unwrap_or(DEFAULT_WEEKLY_COUNT);
        let week_start: Weekday = parse_var(&lookup, "GFS_WEEK_START")?.unwrap_or(DEFAULT_WEEK_START);

        Ok(Self {
            region: lookup("GFS_REGION").unwrap_or(defaults.region),
            backup_tag: Tag::new(
                lookup("GFS_BACKUP_TAG_KEY").unwrap_or(defaults.backup_tag.key),
                lookup("GFS_BACKUP_TAG_VALUE").unwrap_or(defaults.backup_tag.value),
            ),
            policy: GfsPolicy::new(daily_count, weekly_count, week_start),
            source_prefix: lookup("GFS_SOURCE_PREFIX").unwrap_or(defaults.source_prefix),
            backup_suffix: lookup("GFS_BACKUP_SUFFIX").unwrap_or(defaults.backup_suffix),
            dry_run: parse_var(&lookup, "GFS_DRY_RUN")?.unwrap_or(defaults.dry_run),
        })
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the retention policy.
    pub fn with_policy(mut self, policy: GfsPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the opt-in tag.
    pub fn with_backup_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.backup_tag = Tag::new(key, value);
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Backup id deriver for the configured tokens.
    pub fn deriver(&self) -> BackupIdentifierDeriver {
        BackupIdentifierDeriver::new(&self.source_prefix, &self.backup_suffix)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            backup_tag: Tag::new(DEFAULT_BACKUP_TAG_KEY, DEFAULT_BACKUP_TAG_VALUE),
            policy: GfsPolicy::default(),
            source_prefix: DEFAULT_SOURCE_PREFIX.to_string(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            dry_run: false,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
                value,
            }),
    }
}
