//! Embedded Python execution harness
//!
//! Both backends run submitted code through the same small Python program.
//! It reads the code from a file argument or stdin, executes it in a fresh
//! namespace with both output streams captured, and reports the outcome as
//! a single marked JSON line on the interpreter's real stdout. Stream
//! redirection is scoped to the `exec` call, so the report line itself can
//! never be swallowed by the capture.

use serde::Deserialize;

/// Marker prefixing the harness result line on the child's real stdout.
pub const RESULT_MARKER: &str = "__PYTERM_RESULT__";

/// Paths used when the harness and code are copied into a container.
pub const HARNESS_PATH: &str = "/tmp/pyterm_harness.py";
pub const CODE_PATH: &str = "/tmp/pyterm_main.py";

/// The harness program. Compatible with any CPython 3.x.
pub const HARNESS_SCRIPT: &str = r#"
"""Run user code with captured streams and report the outcome as JSON."""

import io
import json
import sys
import time
import traceback
from contextlib import redirect_stderr, redirect_stdout

RESULT_MARKER = "__PYTERM_RESULT__"


def run(code):
    stdout_capture = io.StringIO()
    stderr_capture = io.StringIO()
    ok = True

    start = time.time()
    try:
        with redirect_stdout(stdout_capture), redirect_stderr(stderr_capture):
            exec(code, {})
    except Exception:
        ok = False
        etype, value, tb = sys.exc_info()
        if tb is not None:
            tb = tb.tb_next
        stderr_capture.write("".join(traceback.format_exception(etype, value, tb)))
    elapsed = time.time() - start

    return {
        "stdout": stdout_capture.getvalue(),
        "stderr": stderr_capture.getvalue(),
        "ok": ok,
        "elapsed": elapsed,
    }


def main():
    if len(sys.argv) > 1:
        with open(sys.argv[1], "r") as f:
            code = f.read()
    else:
        code = sys.stdin.read()

    result = run(code)

    sys.stdout.write("\n" + RESULT_MARKER + json.dumps(result) + "\n")
    sys.stdout.flush()


if __name__ == "__main__":
    main()
"#;

/// Result line emitted by the harness.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessResult {
    pub stdout: String,
    pub stderr: String,
    pub ok: bool,
    pub elapsed: f64,
}

/// Scan raw child stdout for the marked result line.
///
/// User code can push bytes past the redirection (`os.write(1, ...)`) or
/// print text containing the marker itself, so the scan walks backwards and
/// takes the last line that both carries the marker and parses as a result.
/// `None` means the interpreter died before reporting; callers fall back to
/// the raw process streams.
pub fn parse_harness_stdout(raw: &str) -> Option<HarnessResult> {
    for line in raw.lines().rev() {
        if let Some(payload) = line.strip_prefix(RESULT_MARKER) {
            if let Ok(result) = serde_json::from_str::<HarnessResult>(payload) {
                return Some(result);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_and_parser_agree_on_marker() {
        assert!(HARNESS_SCRIPT.contains(RESULT_MARKER));
    }

    #[test]
    fn script_executes_in_fresh_namespace() {
        assert!(HARNESS_SCRIPT.contains("exec(code, {})"));
        assert!(HARNESS_SCRIPT.contains("sys.stdin.read()"));
    }

    #[test]
    fn parses_result_line() {
        let raw = format!(
            "\n{}{}\n",
            RESULT_MARKER,
            r#"{"stdout": "hi\n", "stderr": "", "ok": true, "elapsed": 0.0021}"#
        );

        let result = parse_harness_stdout(&raw).unwrap();
        assert_eq!(result.stdout, "hi\n");
        assert_eq!(result.stderr, "");
        assert!(result.ok);
        assert!(result.elapsed > 0.0);
    }

    #[test]
    fn last_result_line_wins() {
        let fake = format!(
            "{}{}",
            RESULT_MARKER,
            r#"{"stdout": "spoofed", "stderr": "", "ok": true, "elapsed": 0.0}"#
        );
        let real = format!(
            "{}{}",
            RESULT_MARKER,
            r#"{"stdout": "real", "stderr": "", "ok": true, "elapsed": 0.5}"#
        );
        let raw = format!("leaked bytes\n{}\n{}\n", fake, real);

        let result = parse_harness_stdout(&raw).unwrap();
        assert_eq!(result.stdout, "real");
    }

    #[test]
    fn malformed_result_line_is_skipped() {
        let good = format!(
            "{}{}",
            RESULT_MARKER,
            r#"{"stdout": "ok", "stderr": "", "ok": true, "elapsed": 0.1}"#
        );
        let raw = format!("{}\n{}not json at all\n", good, RESULT_MARKER);

        let result = parse_harness_stdout(&raw).unwrap();
        assert_eq!(result.stdout, "ok");
    }

    #[test]
    fn missing_marker_means_no_result() {
        assert!(parse_harness_stdout("Segmentation fault\n").is_none());
        assert!(parse_harness_stdout("").is_none());
    }
}
