// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Conversation turns ───────────────────────────────────────────────────────

/// One turn in the agent conversation.
///
/// Ai turns may carry tool-call requests; tool-result turns answer a specific
/// request through `call_id`. The serialized form tags on `role` so a
/// checkpointed conversation reads naturally in logs and fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Ai {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        /// Name of the tool that produced this result.
        name: String,
        content: String,
        /// Id of the tool-call request this result answers.
        call_id: String,
    },
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System { content: content.into() }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::Human { content: content.into() }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai { content: content.into(), tool_calls: Vec::new() }
    }

    pub fn ai_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self::Ai { content: content.into(), tool_calls }
    }

    pub fn tool_result(
        name: impl Into<String>,
        content: impl Into<String>,
        call_id: impl Into<String>,
    ) -> Self {
        Self::Tool {
            name: name.into(),
            content: content.into(),
            call_id: call_id.into(),
        }
    }

    /// The textual content of this turn, whatever its role.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::Human { content }
            | Self::Ai { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    /// Tool-call requests carried by an Ai turn; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Ai { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// The most recent tool-call request of this turn, if any.
    pub fn last_tool_call(&self) -> Option<&ToolCallRequest> {
        self.tool_calls().last()
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai { .. })
    }

    /// Short role label for log lines and CLI output.
    pub fn role_label(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "human",
            Self::Ai { .. } => "ai",
            Self::Tool { .. } => "tool",
        }
    }
}

/// A structured request from the model to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Opaque identifier minted by the model (forwarded verbatim).
    pub id: String,
    pub name: String,
    /// Parsed JSON argument object.
    pub args: Value,
}

// ─── Requests and responses ───────────────────────────────────────────────────

/// A tool schema provided to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the parameters object.
    pub parameters: Value,
}

/// Request sent to a model provider.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub turns: Vec<Turn>,
    pub tools: Vec<ToolSchema>,
}

/// A single event from the model response stream.
///
/// Providers that answer synchronously (Bedrock Converse) emit the full
/// event sequence at once; the consumer drains the stream either way.
#[derive(Debug, Clone)]
pub enum ResponseEvent {
    /// A text chunk from the model.
    TextDelta(String),
    /// The model requests a tool invocation. Arguments arrive as the raw
    /// JSON text; the consumer parses (and may have to repair) them.
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },
    /// Final usage statistics.
    Usage {
        input_tokens: u32,
        output_tokens: u32,
    },
    /// The response finished normally.
    Done,
    /// A recoverable provider-side warning.
    Error(String),
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
