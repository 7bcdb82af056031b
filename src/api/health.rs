//! Health check endpoints
//!
//! This module provides health check endpoints for monitoring
//! and container orchestration (Kubernetes, ECS, etc.)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    pub sandbox: bool,
    pub gemini: bool,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Main health check endpoint
///
/// Returns overall service health status with version and uptime information.
/// Use this for general health monitoring.
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Readiness probe endpoint
///
/// Returns whether the service is ready to accept traffic. The sandbox
/// runtime is checked live; without it every execution would fail, so a
/// dead runtime takes the instance out of rotation.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let sandbox_ok = state.sandbox.probe().await.is_ok();

    let checks = ReadinessChecks {
        config_loaded: true,
        sandbox: sandbox_ok,
        gemini: state.advisor.ready(),
    };

    // Gemini is non-critical: executions still work without suggestions
    let ready = checks.config_loaded && checks.sandbox;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if !ready {
        tracing::warn!(
            checks = ?checks,
            "Service not ready"
        );
    }

    (status, Json(ReadinessResponse { ready, checks }))
}

/// Liveness probe endpoint
///
/// Returns whether the service is alive and should not be restarted.
/// Used by container orchestrators to detect deadlocks or other fatal issues.
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    // Simple liveness check - if we can respond, we're alive
    Json(LivenessResponse { alive: true })
}

/// Response for the sandbox health check endpoint
#[derive(Serialize)]
pub struct SandboxHealthResponse {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

/// Sandbox health check endpoint
///
/// Probes the configured execution backend and reports what it found
/// (interpreter version or Docker daemon version).
///
/// GET /health/sandbox
pub async fn sandbox_health(
    State(state): State<AppState>,
) -> (StatusCode, Json<SandboxHealthResponse>) {
    match state.sandbox.probe().await {
        Ok(runtime) => (
            StatusCode::OK,
            Json(SandboxHealthResponse {
                status: "healthy".to_string(),
                backend: state.sandbox.kind().to_string(),
                runtime: Some(runtime),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "sandbox runtime probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SandboxHealthResponse {
                    status: "unhealthy".to_string(),
                    backend: state.sandbox.kind().to_string(),
                    runtime: None,
                }),
            )
        }
    }
}
