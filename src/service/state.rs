//! Service state management.
//!
//! Contains the shared orchestrator and the reference to its active policy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::OrchestratorConfig;
use crate::orchestrator::Orchestrator;
use crate::policy::GfsPolicy;
use crate::store::SnapshotStore;

/// Reference to a policy by hash.
///
/// Clients compare `params_hash` across responses to detect a policy change
/// between two plans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyRef {
    /// Policy type identifier (e.g., "gfs_policy_v1")
    pub policy_id: String,
    /// xxHash64 of canonical policy JSON
    pub params_hash: String,
}

impl PolicyRef {
    /// Create a policy reference from a GfsPolicy.
    pub fn from_policy(policy: &GfsPolicy) -> Self {
        Self {
            policy_id: policy.policy_id().to_string(),
            params_hash: policy.params_hash(),
        }
    }
}

/// Shared service state.
pub struct ServiceState<S: SnapshotStore> {
    /// Orchestrator over the configured store.
    pub orchestrator: Arc<Orchestrator<S>>,
    policy_ref: PolicyRef,
    started_at: DateTime<Utc>,
}

impl<S: SnapshotStore> ServiceState<S> {
    /// Create service state over a store.
    pub fn new(store: S, config: OrchestratorConfig) -> Self {
        Self::from_orchestrator(Orchestrator::new(Arc::new(store), config))
    }

    /// Wrap an existing orchestrator.
    pub fn from_orchestrator(orchestrator: Orchestrator<S>) -> Self {
        let policy_ref = PolicyRef::from_policy(&orchestrator.config().policy);
        Self {
            orchestrator: Arc::new(orchestrator),
            policy_ref,
            started_at: Utc::now(),
        }
    }

    /// Reference to the active policy.
    pub fn policy_ref(&self) -> &PolicyRef {
        &self.policy_ref
    }

    /// When the service state was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl<S: SnapshotStore> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            policy_ref: self.policy_ref.clone(),
            started_at: self.started_at,
        }
    }
}
