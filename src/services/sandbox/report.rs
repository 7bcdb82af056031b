//! Execution report types

/// Placeholder shown in place of empty captured stdout.
pub const NO_OUTPUT: &str = "No output";

/// Outcome of running one piece of submitted code.
///
/// `stdout` and `stderr` carry the raw captured streams. A run that printed
/// nothing keeps the empty string here; the `"No output"` placeholder is
/// applied at display time via [`ExecutionReport::display_stdout`], so
/// success detection never trips over it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Captured standard output
    pub stdout: String,

    /// Captured standard error, including the formatted traceback on faults
    pub stderr: String,

    /// Elapsed wall-clock seconds for the run
    pub duration_secs: f64,

    /// Whether the run was cancelled by the execution time limit
    pub timed_out: bool,
}

impl ExecutionReport {
    /// A run succeeded exactly when it produced no error text.
    pub fn succeeded(&self) -> bool {
        self.stderr.trim().is_empty()
    }

    /// Captured stdout with the placeholder applied for empty output.
    pub fn display_stdout(&self) -> &str {
        if self.stdout.trim().is_empty() {
            NO_OUTPUT
        } else {
            &self.stdout
        }
    }

    /// Report for a run cut off by the execution time limit.
    pub fn cancelled_after(limit_secs: u64) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Execution timed out after {} seconds", limit_secs),
            duration_secs: limit_secs as f64,
            timed_out: true,
        }
    }
}
