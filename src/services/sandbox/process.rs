//! Subprocess sandbox backend
//!
//! Runs the harness in a local Python child process. This backend is a
//! fault boundary, not a security boundary: submitted code runs with the
//! privileges of the service user, and only the separate process keeps
//! interpreter crashes and stream tampering away from the host service.
//! Deployments that need real isolation use the Docker backend.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::SandboxBackend;

use super::error::{SandboxError, SandboxResult};
use super::harness::{parse_harness_stdout, HARNESS_SCRIPT};
use super::report::ExecutionReport;
use super::Backend;

pub struct ProcessBackend {
    python_bin: String,
    execution_timeout: Option<Duration>,
}

impl ProcessBackend {
    pub fn new(python_bin: impl Into<String>, execution_timeout: Option<Duration>) -> Self {
        Self {
            python_bin: python_bin.into(),
            execution_timeout,
        }
    }

    fn harness_command(&self) -> Command {
        let mut command = Command::new(&self.python_bin);
        // -I ignores user site-packages and PYTHON* environment variables
        command
            .arg("-I")
            .arg("-c")
            .arg(HARNESS_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Backend for ProcessBackend {
    fn kind(&self) -> SandboxBackend {
        SandboxBackend::Process
    }

    async fn probe(&self) -> SandboxResult<String> {
        let output = Command::new(&self.python_bin)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                SandboxError::RuntimeUnavailable(format!("{}: {}", self.python_bin, e))
            })?;

        if !output.status.success() {
            return Err(SandboxError::RuntimeUnavailable(format!(
                "{} --version exited with {}",
                self.python_bin, output.status
            )));
        }

        // Python 2 printed its version on stderr, 3.4+ on stdout
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(String::from_utf8_lossy(&output.stderr).trim().to_string())
        } else {
            Ok(stdout)
        }
    }

    async fn run(&self, code: &str) -> SandboxResult<ExecutionReport> {
        let mut child = self.harness_command().spawn().map_err(|e| {
            SandboxError::LaunchFailed(format!("{}: {}", self.python_bin, e))
        })?;

        // Feed the code over stdin; dropping the handle closes the pipe so
        // the harness sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(code.as_bytes()).await.is_err() {
                tracing::debug!("stdin write failed; interpreter exited early");
            }
        }

        let started = Instant::now();
        let output = match self.execution_timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    // The timed-out future owns the child; dropping it kills
                    // the interpreter via kill_on_drop.
                    return Ok(ExecutionReport::cancelled_after(limit.as_secs()));
                }
            },
            None => child.wait_with_output().await?,
        };
        let wall_clock = started.elapsed().as_secs_f64();

        let raw_stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let raw_stderr = String::from_utf8_lossy(&output.stderr).to_string();

        match parse_harness_stdout(&raw_stdout) {
            Some(result) => Ok(ExecutionReport {
                stdout: result.stdout,
                stderr: result.stderr,
                duration_secs: result.elapsed,
                timed_out: false,
            }),
            None => {
                // The interpreter died before reporting (sys.exit, hard
                // crash, os._exit). Fall back to the raw process streams.
                let stderr = if raw_stderr.trim().is_empty() && !output.status.success() {
                    format!("python exited with {}", output.status)
                } else {
                    raw_stderr
                };
                Ok(ExecutionReport {
                    stdout: raw_stdout,
                    stderr,
                    duration_secs: wall_clock,
                    timed_out: false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYTHON: &str = "python3";

    async fn python_available() -> bool {
        Command::new(PYTHON)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn backend() -> ProcessBackend {
        ProcessBackend::new(PYTHON, Some(Duration::from_secs(10)))
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        if !python_available().await {
            return;
        }

        let report = backend().run("print('Hello World 🌍')").await.unwrap();
        assert_eq!(report.stdout, "Hello World 🌍\n");
        assert_eq!(report.stderr, "");
        assert!(report.succeeded());
        assert!(!report.timed_out);
        assert!(report.duration_secs >= 0.0);
    }

    #[tokio::test]
    async fn captures_traceback_on_fault() {
        if !python_available().await {
            return;
        }

        let report = backend().run("1/0").await.unwrap();
        assert_eq!(report.stdout, "");
        assert!(report.stderr.contains("ZeroDivisionError"));
        assert!(report.stderr.contains("Traceback"));
        assert!(!report.succeeded());
        assert_eq!(report.display_stdout(), "No output");
    }

    #[tokio::test]
    async fn syntax_error_reports_like_any_fault() {
        if !python_available().await {
            return;
        }

        let report = backend().run("definitely not python").await.unwrap();
        assert!(report.stderr.contains("SyntaxError"));
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn partial_output_survives_a_fault() {
        if !python_available().await {
            return;
        }

        let report = backend().run("print('before')\n1/0").await.unwrap();
        assert_eq!(report.stdout, "before\n");
        assert!(report.stderr.contains("ZeroDivisionError"));
    }

    #[tokio::test]
    async fn runaway_code_is_cancelled() {
        if !python_available().await {
            return;
        }

        let backend = ProcessBackend::new(PYTHON, Some(Duration::from_secs(1)));
        let report = backend.run("while True:\n    pass").await.unwrap();
        assert!(report.timed_out);
        assert!(!report.succeeded());
        assert!(report.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn interpreter_exit_falls_back_to_raw_streams() {
        if !python_available().await {
            return;
        }

        let report = backend().run("import sys\nsys.exit(3)").await.unwrap();
        assert!(!report.succeeded());
        assert!(!report.timed_out);
    }

    #[tokio::test]
    async fn consecutive_runs_are_independent() {
        if !python_available().await {
            return;
        }

        let backend = backend();
        let first = backend.run("x = 41\nprint(x + 1)").await.unwrap();
        assert_eq!(first.stdout, "42\n");

        // The namespace from the first run must not leak into the second
        let second = backend.run("print(x)").await.unwrap();
        assert!(second.stderr.contains("NameError"));
    }

    #[tokio::test]
    async fn probe_reports_interpreter_version() {
        if !python_available().await {
            return;
        }

        let version = backend().probe().await.unwrap();
        assert!(version.starts_with("Python"));
    }

    #[tokio::test]
    async fn probe_fails_for_missing_interpreter() {
        let backend = ProcessBackend::new("definitely-not-a-python", None);
        let error = backend.probe().await.unwrap_err();
        assert_eq!(error.status_code(), 503);
    }
}
