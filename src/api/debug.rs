//! Debugging suggestion endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::AdvisorError;

/// Request body for a debugging suggestion
#[derive(Debug, Clone, Deserialize)]
pub struct DebugRequest {
    /// The code that failed
    pub code: String,
    /// The stderr text the failure produced
    pub error: String,
}

/// A debugging suggestion from the model
#[derive(Debug, Clone, Serialize)]
pub struct DebugResponse {
    pub suggestion: String,
    pub model: String,
}

/// Ask the model to explain a failure and propose a fix
///
/// POST /api/debug
pub async fn debug_code(
    State(state): State<AppState>,
    Json(request): Json<DebugRequest>,
) -> Result<Json<DebugResponse>, ApiError> {
    let suggestion = state
        .advisor
        .suggest(&request.code, &request.error)
        .await
        .map_err(|err| match err {
            AdvisorError::EmptyCode | AdvisorError::EmptyError => {
                ApiError::InvalidRequest(err.to_string())
            }
            AdvisorError::Gemini(_) | AdvisorError::EmptySuggestion => {
                ApiError::Upstream(err.to_string())
            }
        })?;

    info!(
        model = %suggestion.model,
        suggestion_len = suggestion.text.len(),
        "Debug suggestion generated"
    );

    Ok(Json(DebugResponse {
        suggestion: suggestion.text,
        model: suggestion.model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_requires_both_fields() {
        let result = serde_json::from_str::<DebugRequest>(r#"{"code": "1/0"}"#);
        assert!(result.is_err());

        let request: DebugRequest =
            serde_json::from_str(r#"{"code": "1/0", "error": "ZeroDivisionError"}"#).unwrap();
        assert_eq!(request.code, "1/0");
        assert_eq!(request.error, "ZeroDivisionError");
    }

    #[test]
    fn response_serializes_both_fields() {
        let response = DebugResponse {
            suggestion: "Guard the divisor before dividing.".to_string(),
            model: "gemini-2.0-flash".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["suggestion"], "Guard the divisor before dividing.");
        assert_eq!(json["model"], "gemini-2.0-flash");
    }
}
