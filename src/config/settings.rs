//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.
//! `GEMINI_API_KEY` is the one hard requirement; everything else falls
//! back to a default.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!("Invalid environment: {}. Expected: development, staging, or production", s),
        }
    }
}

/// Sandbox backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SandboxBackend {
    /// Local subprocess, no isolation beyond the process boundary
    Process,
    /// Throwaway Docker container per run
    Docker,
}

impl fmt::Display for SandboxBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxBackend::Process => write!(f, "process"),
            SandboxBackend::Docker => write!(f, "docker"),
        }
    }
}

impl Default for SandboxBackend {
    fn default() -> Self {
        SandboxBackend::Process
    }
}

impl std::str::FromStr for SandboxBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" | "subprocess" => Ok(SandboxBackend::Process),
            "docker" | "container" => Ok(SandboxBackend::Docker),
            _ => anyhow::bail!("Invalid sandbox backend: {}. Expected: process or docker", s),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_window: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: 100,
            window_seconds: 60,
        }
    }
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiSettings {
    /// API keys, rotated round-robin across requests
    #[serde(skip_serializing, default)]
    pub api_keys: Vec<String>,
    /// Model asked for debugging suggestions
    pub model: String,
    /// Override for the API base URL, mainly for tests
    pub base_url: Option<String>,
    /// Outbound request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: "gemini-2.0-flash".to_string(),
            base_url: None,
            timeout_seconds: 30,
        }
    }
}

/// Execution sandbox configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SandboxSettings {
    pub backend: SandboxBackend,
    /// Interpreter binary for the process backend
    pub python_bin: String,
    /// Container image for the docker backend
    pub image: String,
    /// Per-run time limit in seconds, 0 disables enforcement
    pub execution_timeout_seconds: u64,
    /// Container memory ceiling in megabytes
    pub memory_limit_mb: u64,
    /// Whether containers run without network access
    pub network_disabled: bool,
    /// How many submissions may run at once
    pub max_concurrency: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            backend: SandboxBackend::Process,
            python_bin: "python3".to_string(),
            image: "python:3.11-slim".to_string(),
            execution_timeout_seconds: 30,
            memory_limit_mb: 256,
            network_disabled: true,
            max_concurrency: 4,
        }
    }
}

impl SandboxSettings {
    /// Per-run time limit, `None` when enforcement is disabled.
    pub fn execution_timeout(&self) -> Option<Duration> {
        if self.execution_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.execution_timeout_seconds))
        }
    }

    pub fn memory_limit_bytes(&self) -> i64 {
        (self.memory_limit_mb * 1024 * 1024) as i64
    }
}

/// Editor session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Idle seconds before a session expires
    pub ttl_seconds: u64,
    /// How often the background sweep removes expired sessions
    pub sweep_interval_seconds: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            sweep_interval_seconds: 300,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    // Gemini API
    pub gemini: GeminiSettings,

    // Execution sandbox
    pub sandbox: SandboxSettings,

    // Editor sessions
    pub session: SessionSettings,

    // Rate limiting
    pub rate_limit: RateLimitConfig,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let api_key = env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY must be set (comma-separate multiple keys)")?;

        let settings = Self {
            // App settings
            app_name: env_or_default("APP_NAME", "pyterm"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),

            // Server settings
            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            // Gemini API
            gemini: GeminiSettings {
                api_keys: api_key
                    .split(',')
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
                    .collect(),
                model: env_or_default("GEMINI_MODEL", "gemini-2.0-flash"),
                base_url: env::var("GEMINI_BASE_URL").ok(),
                timeout_seconds: env_or_default("GEMINI_TIMEOUT_SECONDS", "30")
                    .parse()
                    .unwrap_or(30),
            },

            // Execution sandbox
            sandbox: SandboxSettings {
                backend: env_or_default("SANDBOX_BACKEND", "process")
                    .parse()
                    .unwrap_or_default(),
                python_bin: env_or_default("SANDBOX_PYTHON_BIN", "python3"),
                image: env_or_default("SANDBOX_IMAGE", "python:3.11-slim"),
                execution_timeout_seconds: env_or_default("SANDBOX_EXECUTION_TIMEOUT", "30")
                    .parse()
                    .unwrap_or(30),
                memory_limit_mb: env_or_default("SANDBOX_MEMORY_LIMIT_MB", "256")
                    .parse()
                    .unwrap_or(256),
                network_disabled: env_or_default("SANDBOX_NETWORK_DISABLED", "true")
                    .parse()
                    .unwrap_or(true),
                max_concurrency: env_or_default("SANDBOX_MAX_CONCURRENCY", "4")
                    .parse()
                    .unwrap_or(4),
            },

            // Editor sessions
            session: SessionSettings {
                ttl_seconds: env_or_default("SESSION_TTL_SECONDS", "3600")
                    .parse()
                    .unwrap_or(3600),
                sweep_interval_seconds: env_or_default("SESSION_SWEEP_SECONDS", "300")
                    .parse()
                    .unwrap_or(300),
            },

            // Rate limiting
            rate_limit: RateLimitConfig {
                enabled: env_or_default("RATE_LIMIT_ENABLED", "true")
                    .parse()
                    .unwrap_or(true),
                requests_per_window: env_or_default("RATE_LIMIT_REQUESTS_PER_WINDOW", "100")
                    .parse()
                    .unwrap_or(100),
                window_seconds: env_or_default("RATE_LIMIT_WINDOW_SECONDS", "60")
                    .parse()
                    .unwrap_or(60),
            },
        };

        // Validate settings
        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    fn validate(&self) -> Result<()> {
        // Validate port range
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.gemini.api_keys.is_empty() {
            anyhow::bail!("GEMINI_API_KEY is set but contains no usable key");
        }

        // Validate rate limit settings
        if self.rate_limit.enabled {
            if self.rate_limit.requests_per_window == 0 {
                anyhow::bail!("Rate limit requests_per_window must be > 0");
            }
            if self.rate_limit.window_seconds == 0 {
                anyhow::bail!("Rate limit window_seconds must be > 0");
            }
        }

        // Validate sandbox settings
        if self.sandbox.max_concurrency == 0 {
            anyhow::bail!("Sandbox max_concurrency must be > 0");
        }
        match self.sandbox.backend {
            SandboxBackend::Process => {
                if self.sandbox.python_bin.trim().is_empty() {
                    anyhow::bail!("SANDBOX_PYTHON_BIN must not be empty");
                }
            }
            SandboxBackend::Docker => {
                if self.sandbox.image.trim().is_empty() {
                    anyhow::bail!("SANDBOX_IMAGE must not be empty");
                }
            }
        }

        // Validate session settings
        if self.session.ttl_seconds == 0 {
            anyhow::bail!("Session ttl_seconds must be > 0");
        }
        if self.session.sweep_interval_seconds == 0 {
            anyhow::bail!("Session sweep_interval_seconds must be > 0");
        }

        // Warn when production runs without container isolation
        if self.environment == Environment::Production
            && self.sandbox.backend == SandboxBackend::Process
        {
            tracing::warn!("Running the process sandbox in production; submitted code is not isolated!");
        }

        Ok(())
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "pyterm".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            gemini: GeminiSettings::default(),
            sandbox: SandboxSettings::default(),
            session: SessionSettings::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
