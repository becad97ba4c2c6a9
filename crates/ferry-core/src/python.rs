// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::WorkflowError;

/// Harness executed by the interpreter.  `sys.argv[1]` is the source path;
/// the input document arrives on stdin and the result leaves on stdout.
/// Exit 3 marks a load failure (bad syntax, no `transform` function),
/// exit 4 an execution failure inside the generated code.
const HARNESS: &str = r#"
import importlib.util, importlib.machinery, json, sys

_loader = importlib.machinery.SourceFileLoader("transform", sys.argv[1])
module_spec = importlib.util.spec_from_file_location("transform", sys.argv[1], loader=_loader)
if module_spec is None or module_spec.loader is None:
    sys.stderr.write("cannot load transform module from " + sys.argv[1])
    sys.exit(3)
module = importlib.util.module_from_spec(module_spec)
try:
    module_spec.loader.exec_module(module)
except BaseException as exc:
    sys.stderr.write(type(exc).__name__ + ": " + str(exc))
    sys.exit(3)
fn = getattr(module, "transform", None)
if not callable(fn):
    sys.stderr.write("source defines no function named 'transform'")
    sys.exit(3)
data = json.load(sys.stdin)
try:
    result = fn(data)
    json.dump(result, sys.stdout)
except BaseException as exc:
    sys.stderr.write(type(exc).__name__ + ": " + str(exc))
    sys.exit(4)
"#;

/// Executes generated transform code outside the host process.
///
/// The source is run under `python -I` (isolated mode: no user site-packages,
/// no `PYTHON*` environment) in a child process that is killed when the
/// wall-clock timeout elapses.  Generated code can therefore fail — or hang —
/// without taking the workflow down; every outcome maps onto the
/// [`WorkflowError`] taxonomy.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    bin: String,
    timeout: Duration,
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self { bin: "python3".into(), timeout: Duration::from_secs(30) }
    }
}

impl PythonRunner {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self { bin: bin.into(), timeout }
    }

    /// Load the transform at `source` and apply it to `input`, returning the
    /// produced document.
    pub async fn execute(&self, source: &Path, input: &Value) -> Result<Value, WorkflowError> {
        debug!(source = %source.display(), "executing transform");

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-I")
            .arg("-c")
            .arg(HARNESS)
            .arg(source)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            WorkflowError::TransformExecution(format!("failed to spawn '{}': {e}", self.bin))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = input.to_string();
            stdin.write_all(payload.as_bytes()).await.map_err(|e| {
                WorkflowError::TransformExecution(format!("writing input to interpreter: {e}"))
            })?;
            // Dropping stdin closes the pipe so json.load sees EOF.
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(WorkflowError::TransformExecution(format!(
                    "waiting for interpreter: {e}"
                )))
            }
            Err(_) => {
                return Err(WorkflowError::TransformExecution(format!(
                    "timeout after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(0) => serde_json::from_slice(&output.stdout).map_err(|e| {
                WorkflowError::TransformExecution(format!(
                    "transform produced invalid JSON output: {e}"
                ))
            }),
            Some(3) => Err(WorkflowError::TransformLoad(stderr)),
            Some(4) => Err(WorkflowError::TransformExecution(stderr)),
            code => Err(WorkflowError::TransformExecution(format!(
                "interpreter exited with {code:?}: {stderr}"
            ))),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
