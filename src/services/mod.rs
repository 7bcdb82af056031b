//! Services module
//!
//! Contains business logic and external service integrations.

pub mod advisor;
pub mod gemini;
pub mod sandbox;
pub mod session;
pub mod templates;

pub use advisor::{AdvisorError, DebugAdvisor, Suggestion};
pub use gemini::{GeminiService, GeminiServiceError};
pub use sandbox::{
    Backend, DockerBackend, ExecutionReport, ProcessBackend, PythonSandbox, SandboxError,
    SandboxResult,
};
pub use session::{Session, SessionStore};
pub use templates::{CodeTemplate, TEMPLATES};
