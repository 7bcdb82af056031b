//! Application state container
//!
//! This module defines the shared application state that is passed
//! to all request handlers via Axum's state extraction.

use crate::config::Settings;
use crate::services::{DebugAdvisor, GeminiService, PythonSandbox, SessionStore};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// This struct holds all the shared resources that handlers need access to.
/// It is designed to be cheaply cloneable (via Arc) and thread-safe.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Sandbox used to run submitted code
    pub sandbox: Arc<PythonSandbox>,

    /// Gemini-backed debugging advisor
    pub advisor: Arc<DebugAdvisor>,

    /// In-memory session store
    pub sessions: Arc<SessionStore>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// This initializes the sandbox, the Gemini client and the session
    /// store. A Docker backend that cannot reach the daemon fails startup
    /// here rather than on the first request.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let start_time = Instant::now();

        tracing::debug!(
            backend = %settings.sandbox.backend,
            "Initializing sandbox"
        );
        let sandbox = Arc::new(PythonSandbox::from_settings(&settings.sandbox).await?);

        match sandbox.probe().await {
            Ok(runtime) => tracing::info!(%runtime, "Sandbox runtime available"),
            Err(e) => tracing::warn!(
                "Sandbox probe failed: {}. Executions will fail until the runtime is available.",
                e
            ),
        }

        tracing::debug!("Creating Gemini client");
        let gemini = GeminiService::new(&settings.gemini)?;
        let advisor = Arc::new(DebugAdvisor::new(gemini, settings.gemini.model.clone()));

        let sessions = Arc::new(SessionStore::new(settings.session.ttl_seconds));

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            settings,
            sandbox,
            advisor,
            sessions,
            start_time,
        })
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
