//! Starter code templates

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::templates::{self, CodeTemplate};

/// Response body listing all templates
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<CodeTemplate>,
}

/// List the built-in templates
///
/// GET /api/templates
pub async fn list_templates(State(_state): State<AppState>) -> Json<TemplateListResponse> {
    Json(TemplateListResponse {
        templates: templates::TEMPLATES.to_vec(),
    })
}

/// Fetch a single template by name
///
/// GET /api/templates/:name
pub async fn get_template(
    State(_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CodeTemplate>, ApiError> {
    templates::find(&name)
        .copied()
        .map(Json)
        .ok_or(ApiError::TemplateNotFound(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_serializes_as_object() {
        let response = TemplateListResponse {
            templates: templates::TEMPLATES.to_vec(),
        };

        let json = serde_json::to_value(&response).unwrap();
        let list = json["templates"].as_array().unwrap();
        assert_eq!(list.len(), templates::TEMPLATES.len());
        assert_eq!(list[0]["name"], "Hello World");
    }
}
