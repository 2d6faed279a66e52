//! Axum routes for the retention service.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::RetentionError;
use crate::identifier::snapshots_from_records;
use crate::orchestrator::{OrchestratorError, RunReport};
use crate::policy::GfsPolicy;
use crate::store::{InMemorySnapshotStore, SnapshotStore};
use crate::types::{BackupRequest, ResourceId, RetentionPlan, SnapshotId, SnapshotRecord};
use crate::RETENTION_SCHEMA_VERSION;

use super::middleware::{metrics_middleware, record_plan_metrics, record_run_metrics};
use super::state::{PolicyRef, ServiceState};

/// Type alias for the service state with InMemorySnapshotStore.
pub type AppState = ServiceState<InMemorySnapshotStore>;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to plan retention for an explicit snapshot listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Reference instant; defaults to the server clock.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    /// Snapshot listing to plan over.
    pub snapshots: Vec<SnapshotRecord>,
}

/// Retention plan response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    /// Reference instant used.
    pub now: DateTime<Utc>,
    /// Retained snapshot ids, newest first.
    pub retain: Vec<SnapshotId>,
    /// Snapshot ids to delete.
    pub delete: Vec<SnapshotId>,
    /// Deterministic plan fingerprint.
    pub fingerprint: String,
    /// Policy used.
    pub policy_ref: PolicyRef,
    /// Schema version.
    pub schema_version: String,
}

impl PlanResponse {
    fn new(plan: RetentionPlan, policy_ref: PolicyRef) -> Self {
        Self {
            now: plan.now,
            retain: plan.retained_ids(),
            delete: plan.deleted_ids(),
            fingerprint: plan.fingerprint,
            policy_ref,
            schema_version: RETENTION_SCHEMA_VERSION.to_string(),
        }
    }
}

/// Request to derive pending backups for a snapshot listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPlanRequest {
    /// Full snapshot listing of one resource.
    pub snapshots: Vec<SnapshotRecord>,
}

/// Pending backups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPlanResponse {
    /// Copies to issue.
    pub backups: Vec<BackupRequest>,
}

/// Optional reference instant for GET and run endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NowParams {
    /// Reference instant; defaults to the server clock.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

/// Active policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResponse {
    /// Policy parameters.
    pub policy: GfsPolicy,
    /// Reference to the policy.
    pub policy_ref: PolicyRef,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    pub region: String,
    pub policy_ref: PolicyRef,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            code = %self.code,
            error = %self.error,
            correlation_id = ?self.correlation_id,
            "Request error"
        );
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

fn retention_error(e: RetentionError) -> ApiError {
    let code = match &e {
        RetentionError::MalformedTimestamp { .. } => "MALFORMED_TIMESTAMP",
        RetentionError::NonDeterministicOrdering { .. } => "NON_DETERMINISTIC_ORDERING",
    };
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::new(code, e.to_string())),
    )
}

fn orchestrator_error(e: OrchestratorError) -> ApiError {
    match e {
        OrchestratorError::Retention(e) => retention_error(e),
        OrchestratorError::Store(message) => {
            let correlation_id = Uuid::new_v4().to_string();
            tracing::error!(%correlation_id, error = %message, "store call failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(
                    ErrorResponse::new("STORE_ERROR", "Snapshot store call failed")
                        .with_correlation_id(correlation_id)
                        .with_details(message),
                ),
            )
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Plan retention for a snapshot listing supplied in the request.
async fn plan_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let start = Instant::now();
    let now = request.now.unwrap_or_else(Utc::now);

    let snapshots = snapshots_from_records(request.snapshots).map_err(retention_error)?;
    let plan = state
        .orchestrator
        .selector()
        .plan(now, &snapshots)
        .map_err(retention_error)?;

    record_plan_metrics(plan.retain.len(), plan.delete.len(), start.elapsed().as_millis() as u64);
    Ok(Json(PlanResponse::new(plan, state.policy_ref().clone())))
}

/// Derive the backups a snapshot listing still needs.
async fn backup_plan_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BackupPlanRequest>,
) -> Result<Json<BackupPlanResponse>, ApiError> {
    let snapshots = snapshots_from_records(request.snapshots).map_err(retention_error)?;
    let backups = state.orchestrator.deriver().pending_backups(&snapshots);
    Ok(Json(BackupPlanResponse { backups }))
}

/// Preview the prune plan for one resource in the store.
async fn resource_plan_handler(
    State(state): State<Arc<AppState>>,
    Path(resource_id): Path<String>,
    Query(params): Query<NowParams>,
) -> Result<Json<PlanResponse>, ApiError> {
    let start = Instant::now();
    let resource_id = ResourceId::new(resource_id);
    let now = params.now.unwrap_or_else(Utc::now);

    let resources = state
        .orchestrator
        .store()
        .list_resources()
        .await
        .map_err(|e| orchestrator_error(OrchestratorError::from_store(e)))?;
    if !resources.iter().any(|r| r.id == resource_id) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "RESOURCE_NOT_FOUND",
                format!("Resource not found: {}", resource_id),
            )),
        ));
    }

    let plan = state
        .orchestrator
        .preview(&resource_id, now)
        .await
        .map_err(orchestrator_error)?;

    record_plan_metrics(plan.retain.len(), plan.delete.len(), start.elapsed().as_millis() as u64);
    Ok(Json(PlanResponse::new(plan, state.policy_ref().clone())))
}

/// Run backups and pruning for every tagged resource.
async fn run_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<NowParams>,
) -> Result<Json<RunReport>, ApiError> {
    let start = Instant::now();
    let now = params.now.unwrap_or_else(Utc::now);

    let report = state.orchestrator.run(now).await.map_err(orchestrator_error)?;

    record_run_metrics(&report, start.elapsed().as_millis() as u64);
    Ok(Json(report))
}

/// Active policy.
async fn policy_handler(State(state): State<Arc<AppState>>) -> Json<PolicyResponse> {
    Json(PolicyResponse {
        policy: state.orchestrator.config().policy.clone(),
        policy_ref: state.policy_ref().clone(),
    })
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.orchestrator.config();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: RETENTION_SCHEMA_VERSION.to_string(),
        region: config.region.clone(),
        policy_ref: state.policy_ref().clone(),
        dry_run: config.dry_run,
        started_at: state.started_at(),
    })
}

/// Liveness probe endpoint.
///
/// Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the retention service.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Pure planning
        .route("/api/v1/retention/plan", post(plan_handler))
        .route("/api/v1/backups/plan", post(backup_plan_handler))
        .route("/api/v1/policy", get(policy_handler))
        // Store-backed operations
        .route("/api/v1/resources/:resource_id/plan", get(resource_plan_handler))
        .route("/api/v1/runs", post(run_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::types::{Resource, SnapshotKind, Tag};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::TimeZone;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<InMemorySnapshotStore>) {
        let store = InMemorySnapshotStore::new("us-east-1");
        store.add_resource(
            Resource::new("orders", store.default_arn("orders")),
            vec![Tag::new("cj:backup", "true")],
        );
        let id = ResourceId::from("orders");
        let t = |d: u32, h: u32| Utc.with_ymd_and_hms(2020, 3, d, h, 0, 0).unwrap();
        store.add_snapshot(&id, SnapshotRecord::new("rds:orders-2020-03-10-05-00", SnapshotKind::Automated, t(10, 5)));
        store.add_snapshot(&id, SnapshotRecord::new("m-early", SnapshotKind::Manual, t(9, 1)));
        store.add_snapshot(&id, SnapshotRecord::new("m-late", SnapshotKind::Manual, t(9, 22)));

        let store = Arc::new(store);
        let orchestrator = crate::orchestrator::Orchestrator::new(Arc::clone(&store), OrchestratorConfig::default());
        (create_router(ServiceState::from_orchestrator(orchestrator)), store)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["region"], "us-east-1");
        assert_eq!(body["policy_ref"]["policy_id"], "gfs_policy_v1");
    }

    #[tokio::test]
    async fn test_policy() {
        let (app, _) = app();
        let (status, body) = send(app, get("/api/v1/policy")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["policy"]["daily_count"], 35);
        assert_eq!(body["policy"]["weekly_count"], 24);
    }

    #[tokio::test]
    async fn test_plan_for_posted_listing() {
        let (app, _) = app();
        let request = post_json(
            "/api/v1/retention/plan",
            serde_json::json!({
                "now": "2020-03-10T12:00:00Z",
                "snapshots": [
                    {"id": "a", "kind": "manual", "create_time": "2020-03-10T06:00:00Z"},
                    {"id": "b", "kind": "manual", "create_time": "2020-03-09T23:00:00Z"},
                    {"id": "c", "kind": "manual", "create_time": "2020-03-09T18:00:00Z"}
                ]
            }),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["retain"], serde_json::json!(["a", "c"]));
        assert_eq!(body["delete"], serde_json::json!(["b"]));
        assert_eq!(body["fingerprint"].as_str().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_plan_rejects_malformed_timestamp() {
        let (app, _) = app();
        let request = post_json(
            "/api/v1/retention/plan",
            serde_json::json!({"snapshots": [{"id": "nightly", "kind": "manual"}]}),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "MALFORMED_TIMESTAMP");
    }

    #[tokio::test]
    async fn test_backup_plan() {
        let (app, _) = app();
        let request = post_json(
            "/api/v1/backups/plan",
            serde_json::json!({"snapshots": [
                {"id": "rds:orders-2020-03-10-05-00", "kind": "automated"},
                {"id": "rds:orders-2020-03-09-05-00", "kind": "automated"},
                {"id": "orders-2020-03-09-05-00-backup", "kind": "manual", "create_time": "2020-03-09T05:00:00Z"}
            ]}),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["backups"],
            serde_json::json!([{"source": "rds:orders-2020-03-10-05-00", "target": "orders-2020-03-10-05-00-backup"}])
        );
    }

    #[tokio::test]
    async fn test_resource_preview_has_no_side_effects() {
        let (app, store) = app();
        let (status, body) = send(app, get("/api/v1/resources/orders/plan?now=2020-03-09T23:30:00Z")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["retain"], serde_json::json!(["m-early"]));
        assert_eq!(body["delete"], serde_json::json!(["m-late"]));
        assert_eq!(store.num_snapshots(), 3);
    }

    #[tokio::test]
    async fn test_resource_preview_unknown_resource() {
        let (app, _) = app();
        let (status, body) = send(app, get("/api/v1/resources/ghost/plan")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_run_applies_backups_and_deletes() {
        let (app, store) = app();
        let request = post_json("/api/v1/runs", serde_json::json!({"now": "2020-03-10T12:00:00Z"}));
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resources"][0]["backups_created"], serde_json::json!(["orders-2020-03-10-05-00-backup"]));
        assert_eq!(body["resources"][0]["snapshots_deleted"], serde_json::json!(["m-late"]));

        assert!(store.contains(&SnapshotId::from("orders-2020-03-10-05-00-backup")));
        assert!(!store.contains(&SnapshotId::from("m-late")));
    }
}
