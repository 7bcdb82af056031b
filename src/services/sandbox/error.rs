//! Sandbox error types

use thiserror::Error;

/// Errors raised by the execution sandbox.
///
/// Faults in the submitted code itself are never errors here; those come
/// back inside an execution report. This enum covers failures of the
/// machinery around the run.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The configured runtime (interpreter or container daemon) cannot be reached
    #[error("Sandbox runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The interpreter process could not be spawned
    #[error("Failed to launch interpreter: {0}")]
    LaunchFailed(String),

    /// Container creation failed
    #[error("Failed to create container: {0}")]
    ContainerCreationFailed(String),

    /// Copying the harness or code into the container failed
    #[error("Failed to copy files to container: {0}")]
    FileCopyFailed(String),

    /// Running a command inside the container failed
    #[error("Failed to execute command in container: {0}")]
    ExecFailed(String),

    /// I/O error talking to the child runtime
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal sandbox error: {0}")]
    Internal(String),
}

impl SandboxError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            SandboxError::RuntimeUnavailable(_) => 503,
            SandboxError::LaunchFailed(_)
            | SandboxError::ContainerCreationFailed(_)
            | SandboxError::FileCopyFailed(_)
            | SandboxError::ExecFailed(_)
            | SandboxError::Io(_)
            | SandboxError::Internal(_) => 500,
        }
    }
}

/// Result type for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_runtime_maps_to_503() {
        let error = SandboxError::RuntimeUnavailable("docker daemon unreachable".to_string());
        assert_eq!(error.status_code(), 503);
    }

    #[test]
    fn machinery_failures_map_to_500() {
        assert_eq!(
            SandboxError::LaunchFailed("python3: not found".to_string()).status_code(),
            500
        );
        assert_eq!(
            SandboxError::ExecFailed("exec create failed".to_string()).status_code(),
            500
        );
    }

    #[test]
    fn error_display_includes_cause() {
        let error = SandboxError::ContainerCreationFailed("no such image".to_string());
        assert!(error.to_string().contains("no such image"));
    }
}
