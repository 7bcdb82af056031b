//! Debugging suggestion advisor
//!
//! Turns a failed run into a Gemini prompt and extracts the suggestion
//! text from the response. Blank code or blank error text is rejected
//! before any outbound call is made.

use thiserror::Error;

use crate::schemas::gemini::{GeminiRequest, GenerationConfig};
use crate::services::gemini::{GeminiService, GeminiServiceError};

/// Errors from the suggestion flow
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Cannot request a suggestion for empty code")]
    EmptyCode,

    #[error("Cannot request a suggestion without error text")]
    EmptyError,

    #[error(transparent)]
    Gemini(#[from] GeminiServiceError),

    #[error("Gemini returned no suggestion text")]
    EmptySuggestion,
}

/// A debugging suggestion produced by the model
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub text: String,
    pub model: String,
}

/// Asks Gemini to explain a failed run and propose a fix.
pub struct DebugAdvisor {
    gemini: GeminiService,
    model: String,
}

impl DebugAdvisor {
    pub fn new(gemini: GeminiService, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the underlying Gemini client is usable.
    pub fn ready(&self) -> bool {
        self.gemini.health_check()
    }

    /// Build the debugging prompt, rejecting blank inputs.
    pub fn build_prompt(code: &str, error: &str) -> Result<String, AdvisorError> {
        if code.trim().is_empty() {
            return Err(AdvisorError::EmptyCode);
        }
        if error.trim().is_empty() {
            return Err(AdvisorError::EmptyError);
        }

        Ok(format!(
            "You are a Python debugging assistant.\n\n\
             Python Code:\n{code}\n\n\
             Error:\n{error}\n\n\
             Explain the error and suggest a corrected version of the code."
        ))
    }

    /// Ask the model for a suggestion on a failed run.
    pub async fn suggest(&self, code: &str, error: &str) -> Result<Suggestion, AdvisorError> {
        let prompt = Self::build_prompt(code, error)?;

        let request = GeminiRequest::user_prompt(prompt).with_generation_config(GenerationConfig {
            temperature: Some(0.2),
            top_p: None,
            max_output_tokens: Some(1024),
        });

        let response = self.gemini.generate_content(&self.model, &request).await?;

        let text = response
            .response_text()
            .ok_or(AdvisorError::EmptySuggestion)?;

        tracing::debug!(
            model = %self.model,
            suggestion_chars = text.len(),
            "Received debugging suggestion"
        );

        Ok(Suggestion {
            text,
            model: self.model.clone(),
        })
    }
}
