//! Docker sandbox backend
//!
//! Runs each submission in its own throwaway container: create, start,
//! upload the harness and the code as a tar archive, exec the harness,
//! then force-remove the container on every path. Containers get a memory
//! and CPU ceiling, drop all capabilities and (by default) run without
//! network access.

use bollard::container::{
    Config, CreateContainerOptions, LogOutput, RemoveContainerOptions, StartContainerOptions,
    UploadToContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::service::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::SandboxBackend;

use super::error::{SandboxError, SandboxResult};
use super::harness::{parse_harness_stdout, CODE_PATH, HARNESS_PATH, HARNESS_SCRIPT};
use super::report::ExecutionReport;
use super::Backend;

/// Default Docker image for sandbox containers
pub const DEFAULT_SANDBOX_IMAGE: &str = "python:3.11-slim";

/// CPU period (100ms)
const CPU_PERIOD: i64 = 100_000;

/// CPU quota (50% of one core)
const CPU_QUOTA: i64 = 50_000;

/// Working directory inside the container
const WORKING_DIR: &str = "/tmp";

/// Container-side resource and runtime options.
#[derive(Debug, Clone)]
pub struct DockerOptions {
    /// Docker image to run submissions in
    pub image: String,
    /// Memory limit in bytes
    pub memory_limit: i64,
    /// Whether the container runs without network access
    pub network_disabled: bool,
    /// Per-run execution time limit, `None` disables enforcement
    pub execution_timeout: Option<Duration>,
}

impl Default for DockerOptions {
    fn default() -> Self {
        Self {
            image: DEFAULT_SANDBOX_IMAGE.to_string(),
            memory_limit: 256 * 1024 * 1024,
            network_disabled: true,
            execution_timeout: Some(Duration::from_secs(30)),
        }
    }
}

pub struct DockerBackend {
    docker: Docker,
    options: DockerOptions,
}

impl DockerBackend {
    /// Connect to the local Docker daemon and verify it responds.
    pub async fn connect(options: DockerOptions) -> SandboxResult<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| SandboxError::RuntimeUnavailable(e.to_string()))?;

        docker
            .ping()
            .await
            .map_err(|e| SandboxError::RuntimeUnavailable(format!("Failed to ping Docker: {}", e)))?;

        Ok(Self { docker, options })
    }

    async fn create_and_start_container(&self) -> SandboxResult<String> {
        let container_name = format!("pyterm_run_{}", uuid::Uuid::new_v4());

        let host_config = HostConfig {
            memory: Some(self.options.memory_limit),
            cpu_period: Some(CPU_PERIOD),
            cpu_quota: Some(CPU_QUOTA),
            network_mode: if self.options.network_disabled {
                Some("none".to_string())
            } else {
                None
            },
            security_opt: Some(vec!["no-new-privileges".to_string()]),
            cap_drop: Some(vec!["ALL".to_string()]),
            ..Default::default()
        };

        let config = Config {
            image: Some(self.options.image.clone()),
            working_dir: Some(WORKING_DIR.to_string()),
            host_config: Some(host_config),
            // Keep the container alive until the exec has run
            cmd: Some(vec![
                "tail".to_string(),
                "-f".to_string(),
                "/dev/null".to_string(),
            ]),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| SandboxError::ContainerCreationFailed(e.to_string()))?;

        self.docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| SandboxError::ContainerCreationFailed(e.to_string()))?;

        Ok(response.id)
    }

    /// Upload the harness and the submitted code in one tar archive.
    async fn upload_sources(&self, container_id: &str, code: &str) -> SandboxResult<()> {
        let archive = build_upload_archive(code)?;

        let options = UploadToContainerOptions {
            path: WORKING_DIR.to_string(),
            ..Default::default()
        };

        self.docker
            .upload_to_container(container_id, Some(options), archive.into())
            .await
            .map_err(|e| SandboxError::FileCopyFailed(format!("Failed to upload to container: {}", e)))?;

        Ok(())
    }

    async fn exec_harness(&self, container_id: &str) -> SandboxResult<(String, String, i64)> {
        let exec_config = CreateExecOptions {
            cmd: Some(vec![
                "python3".to_string(),
                "-I".to_string(),
                HARNESS_PATH.to_string(),
                CODE_PATH.to_string(),
            ]),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            working_dir: Some(WORKING_DIR.to_string()),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(container_id, exec_config)
            .await
            .map_err(|e| SandboxError::ExecFailed(format!("Failed to create exec: {}", e)))?;

        let start_result = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| SandboxError::ExecFailed(format!("Failed to start exec: {}", e)))?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        if let StartExecResults::Attached { mut output, .. } = start_result {
            while let Some(result) = output.next().await {
                match result {
                    Ok(LogOutput::StdOut { message }) => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "error reading exec output");
                    }
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| SandboxError::ExecFailed(format!("Failed to inspect exec: {}", e)))?;

        Ok((stdout, stderr, inspect.exit_code.unwrap_or(-1)))
    }

    async fn remove_container(&self, container_id: &str) -> SandboxResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(container_id, Some(options))
            .await
            .map_err(|e| SandboxError::Internal(format!("Failed to remove container: {}", e)))?;

        Ok(())
    }

    async fn run_in_container(&self, container_id: &str, code: &str) -> SandboxResult<ExecutionReport> {
        self.upload_sources(container_id, code).await?;

        let started = Instant::now();
        let exec_outcome = match self.options.execution_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.exec_harness(container_id)).await {
                    Ok(result) => result?,
                    Err(_) => return Ok(ExecutionReport::cancelled_after(limit.as_secs())),
                }
            }
            None => self.exec_harness(container_id).await?,
        };
        let wall_clock = started.elapsed().as_secs_f64();

        let (raw_stdout, raw_stderr, exit_code) = exec_outcome;

        match parse_harness_stdout(&raw_stdout) {
            Some(result) => Ok(ExecutionReport {
                stdout: result.stdout,
                stderr: result.stderr,
                duration_secs: result.elapsed,
                timed_out: false,
            }),
            None => {
                // Harness never reported: the interpreter exited on its own
                // or was killed, likely by the memory limit.
                let stderr = if raw_stderr.trim().is_empty() && exit_code != 0 {
                    format!("python exited with status {}", exit_code)
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

#[async_trait]
impl Backend for DockerBackend {
    fn kind(&self) -> SandboxBackend {
        SandboxBackend::Docker
    }

    async fn probe(&self) -> SandboxResult<String> {
        let version = self
            .docker
            .version()
            .await
            .map_err(|e| SandboxError::RuntimeUnavailable(e.to_string()))?;

        Ok(format!(
            "Docker {} (API {})",
            version.version.unwrap_or_default(),
            version.api_version.unwrap_or_default()
        ))
    }

    async fn run(&self, code: &str) -> SandboxResult<ExecutionReport> {
        let container_id = self.create_and_start_container().await?;

        let outcome = self.run_in_container(&container_id, code).await;

        // The container must go away on every path, including timeouts,
        // where force-removal also kills the still-running interpreter.
        if let Err(e) = self.remove_container(&container_id).await {
            tracing::warn!(container_id = %container_id, error = %e, "failed to remove sandbox container");
        }

        outcome
    }
}

/// Build the tar archive carrying the harness and the submitted code.
fn build_upload_archive(code: &str) -> SandboxResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut buffer);

        for (path, content) in [(HARNESS_PATH, HARNESS_SCRIPT), (CODE_PATH, code)] {
            let filename = std::path::Path::new(path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file");

            let mut header = tar::Header::new_gnu();
            header
                .set_path(filename)
                .map_err(|e| SandboxError::FileCopyFailed(format!("Failed to set tar path: {}", e)))?;
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();

            builder
                .append(&header, content.as_bytes())
                .map_err(|e| SandboxError::FileCopyFailed(format!("Failed to append to tar: {}", e)))?;
        }

        builder
            .finish()
            .map_err(|e| SandboxError::FileCopyFailed(format!("Failed to finish tar: {}", e)))?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn default_options_lock_the_container_down() {
        let options = DockerOptions::default();
        assert_eq!(options.image, DEFAULT_SANDBOX_IMAGE);
        assert!(options.network_disabled);
        assert!(options.execution_timeout.is_some());
    }

    #[test]
    fn upload_archive_carries_harness_and_code() {
        let archive = build_upload_archive("print('hi')").unwrap();

        let mut entries = Vec::new();
        let mut reader = tar::Archive::new(&archive[..]);
        for entry in reader.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().to_string();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            entries.push((path, content));
        }

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "pyterm_harness.py");
        assert!(entries[0].1.contains("exec(code, {})"));
        assert_eq!(entries[1].0, "pyterm_main.py");
        assert_eq!(entries[1].1, "print('hi')");
    }
}
