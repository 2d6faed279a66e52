//! Retention REST Service
//!
//! Exposes retention planning and orchestrator runs as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/retention/plan` - Plan retention for a posted snapshot listing
//! - `POST /api/v1/backups/plan` - Derive pending backups for a posted listing
//! - `GET /api/v1/policy` - Active policy and its params hash
//! - `GET /api/v1/resources/:resource_id/plan` - Preview the prune plan for a stored resource
//! - `POST /api/v1/runs` - Back up and prune every tagged resource
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_plan_metrics, record_run_metrics};
pub use routes::{create_router, AppState, ErrorResponse};
pub use state::{PolicyRef, ServiceState};
