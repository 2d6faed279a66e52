//! Day-by-day retention simulation.
//!
//! A virtual clock drives capture and pruning for any number of resources,
//! without a store or I/O. Each [`step`](RetentionSimulator::step):
//!
//! 1. captures one manual snapshot per resource at the clock
//! 2. plans retention at the clock and drops the delete set
//! 3. advances the clock by one day

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::RetentionError;
use crate::policy::GfsPolicy;
use crate::selector::RetentionSelector;
use crate::types::{ResourceId, Snapshot};

const SNAPSHOT_ID_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Simulated snapshot history under a retention policy.
#[derive(Debug, Clone)]
pub struct RetentionSimulator {
    selector: RetentionSelector,
    clock: DateTime<Utc>,
    seq: u64,
    resources: BTreeMap<ResourceId, Vec<Snapshot>>,
}

impl RetentionSimulator {
    /// Create a simulator starting at `start` with no resources.
    pub fn new(start: DateTime<Utc>, policy: GfsPolicy) -> Self {
        Self {
            selector: RetentionSelector::new(policy),
            clock: start,
            seq: 0,
            resources: BTreeMap::new(),
        }
    }

    /// Builder: add a resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.add_resource(ResourceId::new(resource));
        self
    }

    /// Add a resource with an empty history.
    pub fn add_resource(&mut self, resource: ResourceId) {
        self.resources.entry(resource).or_default();
    }

    /// Current simulated instant.
    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    /// Number of snapshots captured so far, across resources.
    pub fn captured(&self) -> u64 {
        self.seq
    }

    /// Surviving snapshots of a resource, newest first.
    pub fn snapshots(&self, resource: &ResourceId) -> &[Snapshot] {
        self.resources.get(resource).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Creation days of a resource's surviving snapshots, oldest first.
    pub fn retained_dates(&self, resource: &ResourceId) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.snapshots(resource).iter().map(Snapshot::created_on).collect();
        dates.sort_unstable();
        dates
    }

    /// Simulate one day.
    pub fn step(&mut self) -> Result<(), RetentionError> {
        let now = self.clock;
        for history in self.resources.values_mut() {
            self.seq += 1;
            let id = format!("{}-{}", self.seq, now.format(SNAPSHOT_ID_TIME_FORMAT));
            history.push(Snapshot::manual(id, now));

            let retained = self.selector.select(now, history)?;
            *history = retained;
        }
        self.clock = now + Duration::days(1);
        Ok(())
    }

    /// Simulate `days` consecutive days.
    pub fn run(&mut self, days: u32) -> Result<(), RetentionError> {
        for _ in 0..days {
            self.step()?;
        }
        Ok(())
    }
}
