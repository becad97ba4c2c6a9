// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{Tool, ToolCall, ToolOutput, Transform};

/// Tool the model calls to materialize a transform.
///
/// Execution validates the arguments and returns the constructed
/// [`Transform`] serialized as JSON; persistence and id assignment are the
/// workflow's responsibility, not the tool's.
pub struct MakeTransformTool;

#[async_trait]
impl Tool for MakeTransformTool {
    fn name(&self) -> &str {
        "MakeTransform"
    }

    fn description(&self) -> &str {
        "Create the Python transform for the index-level settings JSON. \
         Provide the import block, a prose description of the transformation \
         logic, and the code body. The code may define helper functions but \
         the final transformation must be a single function with the \
         signature `def transform(source_json: Dict[str, Any]) -> Dict[str, Any]:`."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "imports": {
                    "type": "string",
                    "description": "Import statements required by the code body."
                },
                "description": {
                    "type": "string",
                    "description": "What the transformation does, in prose."
                },
                "code": {
                    "type": "string",
                    "description": "The transform code, defining transform(source_json)."
                }
            },
            "required": ["imports", "description", "code"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        match Transform::from_args(&call.args) {
            Ok(transform) => match serde_json::to_string(&transform) {
                Ok(serialized) => ToolOutput::ok(&call.id, serialized),
                Err(e) => ToolOutput::err(&call.id, format!("serializing transform: {e}")),
            },
            Err(msg) => ToolOutput::err(&call.id, msg),
        }
    }
}

/// Tool the model may call to request a test run of the current transform.
///
/// In the default edge configuration testing is driven by the fixed
/// TestTransform stage rather than by a model-issued call, so execution only
/// acknowledges the request.
pub struct TestTransformTool;

#[async_trait]
impl Tool for TestTransformTool {
    fn name(&self) -> &str {
        "TestTransform"
    }

    fn description(&self) -> &str {
        "Execute the most recently created transform against the stored input \
         fixture and report the result. Takes no arguments."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        ToolOutput::ok(
            &call.id,
            "Transform test scheduled; results will follow as a TestTransform tool result.",
        )
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
