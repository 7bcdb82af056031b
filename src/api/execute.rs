//! Code execution endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::sandbox::ExecutionReport;

/// Request body for code execution
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    /// Python source to run. Arbitrary content is accepted; an empty string
    /// simply produces an empty successful run.
    pub code: String,

    /// Session to record the submitted code on
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Result of a code execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub duration_secs: f64,
    pub timed_out: bool,
}

impl From<ExecutionReport> for ExecuteResponse {
    fn from(report: ExecutionReport) -> Self {
        Self {
            success: report.succeeded(),
            stdout: report.stdout,
            stderr: report.stderr,
            duration_secs: report.duration_secs,
            timed_out: report.timed_out,
        }
    }
}

/// Execute submitted code in the sandbox
///
/// When a session id comes along, the code is recorded on that session
/// first, so a reloaded page finds what was last run. An unknown session
/// id fails the request before anything executes.
///
/// POST /api/execute
pub async fn execute_code(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    if let Some(ref session_id) = request.session_id {
        if !state.sessions.set_code(session_id, request.code.clone()).await {
            return Err(ApiError::SessionNotFound(session_id.clone()));
        }
    }

    let report = state.sandbox.execute(&request.code).await?;

    Ok(Json(report.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success_mirrors_report() {
        let report = ExecutionReport {
            stdout: "Hello World 🌍\n".to_string(),
            stderr: String::new(),
            duration_secs: 0.0012,
            timed_out: false,
        };

        let response = ExecuteResponse::from(report);
        assert!(response.success);
        assert_eq!(response.stdout, "Hello World 🌍\n");
        assert_eq!(response.stderr, "");
    }

    #[test]
    fn response_failure_keeps_partial_stdout() {
        let report = ExecutionReport {
            stdout: "before\n".to_string(),
            stderr: "ZeroDivisionError: division by zero".to_string(),
            duration_secs: 0.002,
            timed_out: false,
        };

        let response = ExecuteResponse::from(report);
        assert!(!response.success);
        assert_eq!(response.stdout, "before\n");
    }

    #[test]
    fn empty_stdout_is_not_substituted_on_the_wire() {
        let report = ExecutionReport {
            stdout: String::new(),
            stderr: String::new(),
            duration_secs: 0.001,
            timed_out: false,
        };

        let response = ExecuteResponse::from(report);
        // The "No output" placeholder belongs to the display layer only
        assert_eq!(response.stdout, "");
        assert!(response.success);
    }

    #[test]
    fn request_accepts_missing_session_id() {
        let request: ExecuteRequest = serde_json::from_str(r#"{"code": "1/0"}"#).unwrap();
        assert_eq!(request.code, "1/0");
        assert!(request.session_id.is_none());
    }
}
