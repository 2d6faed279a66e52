//! Service middleware for metrics and request tracking.
//!
//! ## Metrics Exposed
//!
//! - `request`: request count and latency by route, method, status
//! - `retention_plan`: retained/deleted counts per computed plan
//! - `run`: resources, backups, deletions and failures per orchestrator run

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

use crate::orchestrator::RunReport;

/// Metrics middleware that records request counts and latency.
///
/// Install with `route_layer` so the matched route pattern is available;
/// the pattern keeps resource ids out of the `path` field.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "gfs_retention::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Record retention plan metrics.
pub fn record_plan_metrics(retained: usize, deleted: usize, latency_ms: u64) {
    info!(
        target: "gfs_retention::metrics",
        metric_type = "retention_plan",
        retained = retained,
        deleted = deleted,
        latency_ms = latency_ms,
        "retention_plan_metric"
    );
}

/// Record orchestrator run metrics.
pub fn record_run_metrics(report: &RunReport, latency_ms: u64) {
    info!(
        target: "gfs_retention::metrics",
        metric_type = "run",
        run_id = %report.run_id,
        dry_run = report.dry_run,
        resources = report.resources.len(),
        backups_created = report.total_backups_created(),
        deleted = report.total_deleted(),
        failed_resources = report.failed_resources().len(),
        latency_ms = latency_ms,
        "run_metric"
    );
}
