//! Gemini service for Google Gemini API interactions
//!
//! This module handles communication with Google Gemini API using REST.
//! Multiple API keys are supported and rotated round-robin; a custom base
//! URL can be configured to point at a stub server in tests.

use crate::config::GeminiSettings;
use crate::schemas::gemini::{GeminiError, GeminiRequest, GeminiResponse};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when calling the Gemini API
#[derive(Error, Debug)]
pub enum GeminiServiceError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Missing API key")]
    MissingApiKey,
}

// ============================================================================
// Gemini Service
// ============================================================================

/// Service for interacting with Google Gemini API
pub struct GeminiService {
    /// HTTP client
    client: Client,

    /// Base URL for API calls
    base_url: Option<String>,

    /// API keys, used round-robin
    api_keys: Vec<String>,

    /// Rotation cursor
    cursor: AtomicUsize,
}

impl GeminiService {
    /// Create a new Gemini service
    pub fn new(settings: &GeminiSettings) -> Result<Self, GeminiServiceError> {
        if settings.api_keys.is_empty() {
            return Err(GeminiServiceError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        tracing::info!(
            key_count = settings.api_keys.len(),
            "Initialized Gemini service"
        );

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_keys: settings.api_keys.clone(),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Get the base URL
    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(GEMINI_API_BASE)
    }

    /// Next key in rotation
    fn next_key(&self) -> &str {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.api_keys.len();
        &self.api_keys[idx]
    }

    /// Generate content (non-streaming)
    ///
    /// # Arguments
    /// * `model` - Model name (e.g., "gemini-2.0-flash")
    /// * `request` - The request body
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GeminiServiceError> {
        let url = format!("{}/models/{}:generateContent", self.base_url(), model);

        tracing::debug!(
            model = %model,
            url = %url,
            "Calling Gemini generateContent API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.next_key())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as Gemini error
            if let Ok(gemini_error) = serde_json::from_str::<GeminiError>(&error_text) {
                return Err(GeminiServiceError::ApiError {
                    code: gemini_error.error.code,
                    message: gemini_error.error.message,
                });
            }

            return Err(GeminiServiceError::ApiError {
                code: status.as_u16() as i32,
                message: error_text,
            });
        }

        let response_text = response.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, body = %response_text, "Failed to parse Gemini response");
            GeminiServiceError::ParseError(e.to_string())
        })
    }

    /// Check if the service is usable (at least one key configured)
    pub fn health_check(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Get the number of configured API keys
    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_keys(keys: &[&str]) -> GeminiSettings {
        GeminiSettings {
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            ..GeminiSettings::default()
        }
    }

    #[test]
    fn test_service_creation() {
        let service = GeminiService::new(&settings_with_keys(&["key1", "key2"]))
            .expect("Should create service");

        assert_eq!(service.key_count(), 2);
        assert!(service.health_check());
    }

    #[test]
    fn test_empty_keys_error() {
        let result = GeminiService::new(&settings_with_keys(&[]));
        assert!(matches!(result, Err(GeminiServiceError::MissingApiKey)));
    }

    #[test]
    fn test_keys_rotate_round_robin() {
        let service = GeminiService::new(&settings_with_keys(&["key1", "key2"])).unwrap();

        assert_eq!(service.next_key(), "key1");
        assert_eq!(service.next_key(), "key2");
        assert_eq!(service.next_key(), "key1");
    }

    #[test]
    fn test_base_url_defaults_to_google() {
        let service = GeminiService::new(&settings_with_keys(&["key"])).unwrap();
        assert_eq!(service.base_url(), GEMINI_API_BASE);

        let mut settings = settings_with_keys(&["key"]);
        settings.base_url = Some("http://127.0.0.1:9999".to_string());
        let service = GeminiService::new(&settings).unwrap();
        assert_eq!(service.base_url(), "http://127.0.0.1:9999");
    }
}
