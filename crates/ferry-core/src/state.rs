// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use ferry_model::{ToolCallRequest, Turn};
use ferry_tools::Transform;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The conversation state threaded through the workflow.
///
/// Owned exclusively by one run; stages never mutate it directly but return a
/// [`StateUpdate`] that the driver merges via [`WorkflowState::apply`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The source index-settings document to be transformed.
    pub input: Value,
    /// Documents produced by the most recent transform test.
    #[serde(default)]
    pub output: Vec<Value>,
    /// The agent conversation, append-only across stages.
    #[serde(default)]
    pub turns: Vec<Turn>,
    /// The current transform; replaced wholesale on regeneration.
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Assigned on first transform creation, stable afterwards.
    #[serde(default)]
    pub transform_id: Option<String>,
    /// Directory receiving transform sources and fixtures.  Caller-supplied.
    #[serde(default)]
    pub transform_files_dir: PathBuf,
}

impl WorkflowState {
    pub fn new(input: Value, transform_files_dir: impl Into<PathBuf>) -> Self {
        Self {
            input,
            transform_files_dir: transform_files_dir.into(),
            ..Self::default()
        }
    }

    /// Merge a stage's partial update: `turns` appends in order, every other
    /// field overwrites when the update carries a value.
    pub fn apply(&mut self, update: StateUpdate) {
        self.turns.extend(update.turns);
        if let Some(output) = update.output {
            self.output = output;
        }
        if let Some(transform) = update.transform {
            self.transform = Some(transform);
        }
        if let Some(id) = update.transform_id {
            self.transform_id = Some(id);
        }
    }

    /// True when `input` would not give the model anything to transform:
    /// null, `{}`, `[]`, and `""` all count as empty.
    pub fn input_is_empty(&self) -> bool {
        match &self.input {
            Value::Null => true,
            Value::Object(m) => m.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The most recent AI turn, if any.
    pub fn last_ai_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.is_ai())
    }

    /// The tool-call request MakeTransform would act on: the last call of
    /// the most recent AI turn.
    pub fn pending_tool_call(&self) -> Option<&ToolCallRequest> {
        self.last_ai_turn().and_then(Turn::last_tool_call)
    }
}

/// A stage's partial update to the state.  See [`WorkflowState::apply`] for
/// the merge policy.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub turns: Vec<Turn>,
    pub output: Option<Vec<Value>>,
    pub transform: Option<Transform>,
    pub transform_id: Option<String>,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
