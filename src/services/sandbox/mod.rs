//! Code execution sandbox
//!
//! Runs user-submitted Python source in an isolated child runtime and turns
//! the outcome into an [`ExecutionReport`]: both output streams, elapsed
//! wall-clock time and a timeout flag. Two backends share one contract, a
//! local subprocess and a throwaway Docker container. Faults in submitted
//! code never become errors here; they come back inside the report.

pub mod docker;
pub mod error;
pub mod harness;
pub mod process;
pub mod report;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::config::{SandboxBackend, SandboxSettings};
use crate::utils::truncate_with_suffix;

pub use docker::{DockerBackend, DockerOptions};
pub use error::{SandboxError, SandboxResult};
pub use harness::{HarnessResult, HARNESS_SCRIPT, RESULT_MARKER};
pub use process::ProcessBackend;
pub use report::{ExecutionReport, NO_OUTPUT};

/// Execution backend contract shared by the subprocess and Docker runners.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which backend this is, for health reporting
    fn kind(&self) -> SandboxBackend;

    /// Check the underlying runtime and describe it
    async fn probe(&self) -> SandboxResult<String>;

    /// Execute one piece of code to completion, fault or timeout
    async fn run(&self, code: &str) -> SandboxResult<ExecutionReport>;
}

/// The sandbox facade handed to the API layer.
///
/// Wraps the configured backend and caps how many submissions run at once;
/// callers past the cap wait for a permit instead of failing.
pub struct PythonSandbox {
    backend: Arc<dyn Backend>,
    permits: Semaphore,
}

impl PythonSandbox {
    pub fn new(backend: Arc<dyn Backend>, max_concurrency: usize) -> Self {
        Self {
            backend,
            permits: Semaphore::new(max_concurrency),
        }
    }

    /// Build the backend named by the settings.
    ///
    /// The Docker backend connects (and pings) eagerly, so a dead daemon
    /// fails startup instead of the first request.
    pub async fn from_settings(settings: &SandboxSettings) -> SandboxResult<Self> {
        let backend: Arc<dyn Backend> = match settings.backend {
            SandboxBackend::Process => Arc::new(ProcessBackend::new(
                &settings.python_bin,
                settings.execution_timeout(),
            )),
            SandboxBackend::Docker => {
                let options = DockerOptions {
                    image: settings.image.clone(),
                    memory_limit: settings.memory_limit_bytes(),
                    network_disabled: settings.network_disabled,
                    execution_timeout: settings.execution_timeout(),
                };
                Arc::new(DockerBackend::connect(options).await?)
            }
        };

        Ok(Self::new(backend, settings.max_concurrency))
    }

    pub fn kind(&self) -> SandboxBackend {
        self.backend.kind()
    }

    pub async fn probe(&self) -> SandboxResult<String> {
        self.backend.probe().await
    }

    /// Run submitted code, holding one concurrency permit for the duration.
    pub async fn execute(&self, code: &str) -> SandboxResult<ExecutionReport> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SandboxError::Internal("sandbox closed".to_string()))?;

        tracing::debug!(
            backend = %self.backend.kind(),
            code = %truncate_with_suffix(code, 80, "…"),
            "executing submitted code"
        );

        let report = self.backend.run(code).await?;

        tracing::info!(
            backend = %self.backend.kind(),
            duration_secs = report.duration_secs,
            success = report.succeeded(),
            timed_out = report.timed_out,
            "execution finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedBackend {
        report: ExecutionReport,
    }

    #[async_trait]
    impl Backend for CannedBackend {
        fn kind(&self) -> SandboxBackend {
            SandboxBackend::Process
        }

        async fn probe(&self) -> SandboxResult<String> {
            Ok("Python 3.11.0".to_string())
        }

        async fn run(&self, _code: &str) -> SandboxResult<ExecutionReport> {
            Ok(self.report.clone())
        }
    }

    fn sandbox_with(report: ExecutionReport) -> PythonSandbox {
        PythonSandbox::new(Arc::new(CannedBackend { report }), 2)
    }

    #[tokio::test]
    async fn facade_passes_reports_through() {
        let sandbox = sandbox_with(ExecutionReport {
            stdout: "ok\n".to_string(),
            stderr: String::new(),
            duration_secs: 0.004,
            timed_out: false,
        });

        let report = sandbox.execute("print('ok')").await.unwrap();
        assert_eq!(report.stdout, "ok\n");
        assert!(report.succeeded());
        assert_eq!(sandbox.kind(), SandboxBackend::Process);
    }

    #[tokio::test]
    async fn facade_probe_delegates_to_backend() {
        let sandbox = sandbox_with(ExecutionReport {
            stdout: String::new(),
            stderr: String::new(),
            duration_secs: 0.0,
            timed_out: false,
        });

        assert_eq!(sandbox.probe().await.unwrap(), "Python 3.11.0");
    }
}
