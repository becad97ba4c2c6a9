// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! The four workflow stages.  Each is a pure function from state (plus the
//! shared context) to a partial update; the driver in `graph` merges updates
//! and decides what runs next.
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ferry_model::{CompletionRequest, ResponseEvent, ToolCallRequest, ToolSchema, Turn};
use ferry_tools::{ToolCall, Transform};

use crate::{ArtifactStore, StateUpdate, WorkflowContext, WorkflowError, WorkflowState};

/// Precondition gate for the whole pipeline.
///
/// Requires a non-empty `input`, a `transform_files_dir`, and at least one
/// caller-seeded turn (the system prompt and the human request are seeded
/// before `run`; they are preserved, never reset).
pub(crate) fn validate(state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
    if state.input_is_empty() {
        return Err(WorkflowError::MissingState("input"));
    }
    if state.transform_files_dir.as_os_str().is_empty() {
        return Err(WorkflowError::MissingState("transform_files_dir"));
    }
    if state.turns.is_empty() {
        return Err(WorkflowError::MissingState("turns"));
    }
    Ok(StateUpdate::default())
}

/// Send the conversation to the model and append its reply as one AI turn.
///
/// The sole suspension point of the pipeline.  The turn carries any tool-call
/// requests the model made; malformed argument JSON degrades to `{}` and a
/// missing call id gets a synthetic one, with a warning either way.
pub(crate) async fn invoke_llm(
    state: &WorkflowState,
    ctx: &WorkflowContext,
) -> Result<StateUpdate, WorkflowError> {
    let tools: Vec<ToolSchema> = ctx
        .tools
        .schemas()
        .into_iter()
        .map(|s| ToolSchema {
            name: s.name,
            description: s.description,
            parameters: s.parameters,
        })
        .collect();
    let req = CompletionRequest { turns: state.turns.clone(), tools };

    let mut stream = ctx
        .model
        .complete(req)
        .await
        .map_err(|e| WorkflowError::Model(format!("{e:#}")))?;

    let mut text = String::new();
    let mut tool_calls: Vec<ToolCallRequest> = Vec::new();

    while let Some(event) = stream.next().await {
        match event.map_err(|e| WorkflowError::Model(format!("{e:#}")))? {
            ResponseEvent::TextDelta(delta) => text.push_str(&delta),
            ResponseEvent::ToolCall { id, name, arguments } => {
                if name.is_empty() {
                    warn!("dropping tool call with empty name from model");
                    continue;
                }
                let args: Value = match serde_json::from_str(&arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(tool_name = %name, error = %e,
                              "model sent invalid JSON tool arguments; substituting {{}}");
                        Value::Object(Default::default())
                    }
                };
                let id = if id.is_empty() { synthetic_call_id() } else { id };
                tool_calls.push(ToolCallRequest { id, name, args });
            }
            ResponseEvent::Usage { input_tokens, output_tokens } => {
                debug!(input_tokens, output_tokens, "model usage");
            }
            ResponseEvent::Done => break,
            ResponseEvent::Error(e) => warn!("model stream error: {e}"),
        }
    }

    Ok(StateUpdate {
        turns: vec![Turn::ai_with_tool_calls(text, tool_calls)],
        ..StateUpdate::default()
    })
}

/// Materialize the transform the model requested.
///
/// The last tool call of the most recent AI turn is interpreted as a
/// MakeTransform request whatever it was named.  Persists the rendered
/// source and the input fixture, then answers the call with the serialized
/// transform and announces the written path.
pub(crate) async fn make_transform(
    state: &WorkflowState,
    ctx: &WorkflowContext,
) -> Result<StateUpdate, WorkflowError> {
    let request = state
        .pending_tool_call()
        .cloned()
        .ok_or(WorkflowError::NoPendingToolCall)?;

    let call = ToolCall {
        id: request.id.clone(),
        name: "MakeTransform".into(),
        args: request.args.clone(),
    };
    let tool_output = ctx.tools.execute(&call).await;
    if tool_output.is_error {
        return Err(WorkflowError::InvalidTransformArgs(tool_output.content));
    }
    let transform: Transform = serde_json::from_str(&tool_output.content)
        .map_err(|e| WorkflowError::InvalidTransformArgs(e.to_string()))?;

    // Reuse the id across regenerations; mint one only the first time.
    let transform_id = state
        .transform_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!(%transform_id, "generated transform");

    let store = ArtifactStore::new(&state.transform_files_dir);
    let source_path = store.write_source(&transform_id, &transform.to_source())?;
    info!(path = %source_path.display(), "transform written to file");
    store.write_input(&transform_id, &state.input)?;

    let turns = vec![
        Turn::tool_result("MakeTransform", tool_output.content, request.id),
        Turn::ai(format!("Transform created at path: {}", source_path.display())),
    ];

    Ok(StateUpdate {
        turns,
        transform: Some(transform),
        transform_id: Some(transform_id),
        output: None,
    })
}

/// Execute the persisted transform against the stored input fixture.
///
/// The output fixture is written only when execution succeeds.  The
/// tool-result turn answers no real pending call; its id carries the
/// `tc-synthetic-` prefix so consumers can tell it apart.
pub(crate) async fn test_transform(
    state: &WorkflowState,
    ctx: &WorkflowContext,
) -> Result<StateUpdate, WorkflowError> {
    let transform_id = state
        .transform_id
        .as_deref()
        .ok_or(WorkflowError::MissingState("transform_id"))?;

    let store = ArtifactStore::new(&state.transform_files_dir);
    let input = store.read_input(transform_id)?;
    let source_path = store.source_path(transform_id);

    let result = ctx.python.execute(&source_path, &input).await?;
    let output_path = store.write_output(transform_id, &result)?;
    info!(path = %output_path.display(), "transform output written");

    let serialized = serde_json::to_string(&result).unwrap_or_default();
    let documents = match result {
        Value::Array(items) => items,
        other => vec![other],
    };

    let turns = vec![
        Turn::tool_result(
            "TestTransform",
            format!("Result of executing the transform on the input:\n{serialized}"),
            synthetic_call_id(),
        ),
        Turn::ai(format!(
            "Transform tested successfully.  Output written to: {}",
            output_path.display()
        )),
    ];

    Ok(StateUpdate {
        turns,
        output: Some(documents),
        ..StateUpdate::default()
    })
}

fn synthetic_call_id() -> String {
    format!("tc-synthetic-{}", Uuid::new_v4())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use ferry_model::{ModelProvider, ScriptedMockProvider};

    use super::*;
    use crate::PythonRunner;

    const IDENTITY_CODE: &str = "def transform(source_json): return source_json";

    fn ctx_with(model: impl ModelProvider + 'static) -> WorkflowContext {
        WorkflowContext::new(
            Arc::new(model),
            Arc::new(ferry_tools::default_registry()),
            PythonRunner::default(),
        )
    }

    fn seeded_state(dir: &std::path::Path) -> WorkflowState {
        let mut state = WorkflowState::new(json!({"a": 1}), dir);
        state.turns = vec![Turn::system("sys"), Turn::human("please make the transform")];
        state
    }

    fn make_transform_request(id: &str) -> Turn {
        Turn::ai_with_tool_calls(
            "",
            vec![ToolCallRequest {
                id: id.into(),
                name: "MakeTransform".into(),
                args: json!({
                    "imports": "import json",
                    "description": "identity",
                    "code": IDENTITY_CODE,
                }),
            }],
        )
    }

    // ── Validate ──────────────────────────────────────────────────────────────

    #[test]
    fn validate_rejects_missing_input() {
        let mut state = WorkflowState::new(json!(null), "/tmp");
        state.turns = vec![Turn::human("x")];
        match validate(&state) {
            Err(WorkflowError::MissingState(field)) => assert_eq!(field, "input"),
            other => panic!("expected MissingState(input), got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_object_input() {
        let mut state = WorkflowState::new(json!({}), "/tmp");
        state.turns = vec![Turn::human("x")];
        assert!(matches!(
            validate(&state),
            Err(WorkflowError::MissingState("input"))
        ));
    }

    #[test]
    fn validate_rejects_missing_transform_files_dir() {
        let mut state = WorkflowState::new(json!({"a": 1}), "");
        state.turns = vec![Turn::human("x")];
        match validate(&state) {
            Err(WorkflowError::MissingState(field)) => assert_eq!(field, "transform_files_dir"),
            other => panic!("expected MissingState(transform_files_dir), got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_unseeded_turns() {
        let state = WorkflowState::new(json!({"a": 1}), "/tmp");
        assert!(matches!(
            validate(&state),
            Err(WorkflowError::MissingState("turns"))
        ));
    }

    #[test]
    fn validate_preserves_seed_turns() {
        // The explicit resolution of the reset-ordering hazard: seeded turns
        // survive Validate untouched.
        let mut state = seeded_state(std::path::Path::new("/tmp"));
        let update = validate(&state).unwrap();
        assert!(update.turns.is_empty());
        state.apply(update);
        assert_eq!(state.turns.len(), 2);
        assert_eq!(state.turns[0].content(), "sys");
    }

    // ── InvokeLLM ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn invoke_llm_appends_exactly_one_ai_turn() {
        let ctx = ctx_with(ScriptedMockProvider::always_text("on it"));
        let state = seeded_state(std::path::Path::new("/tmp"));
        let update = invoke_llm(&state, &ctx).await.unwrap();
        assert_eq!(update.turns.len(), 1);
        assert!(update.turns[0].is_ai());
        assert_eq!(update.turns[0].content(), "on it");
    }

    #[tokio::test]
    async fn invoke_llm_sends_full_history_and_tool_schemas() {
        let provider = ScriptedMockProvider::always_text("ok");
        let seen = provider.last_request.clone();
        let ctx = ctx_with(provider);
        let state = seeded_state(std::path::Path::new("/tmp"));
        invoke_llm(&state, &ctx).await.unwrap();

        let req = seen.lock().unwrap().clone().unwrap();
        assert_eq!(req.turns.len(), 2);
        let names: Vec<_> = req.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["MakeTransform", "TestTransform"]);
    }

    #[tokio::test]
    async fn invoke_llm_collects_tool_calls() {
        let ctx = ctx_with(ScriptedMockProvider::make_transform(
            "tc-1", "", "identity", IDENTITY_CODE,
        ));
        let state = seeded_state(std::path::Path::new("/tmp"));
        let update = invoke_llm(&state, &ctx).await.unwrap();
        let calls = update.turns[0].tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "MakeTransform");
        assert_eq!(calls[0].args["code"], json!(IDENTITY_CODE));
    }

    #[tokio::test]
    async fn invoke_llm_repairs_malformed_arguments_to_empty_object() {
        let ctx = ctx_with(ScriptedMockProvider::new(vec![vec![
            ResponseEvent::ToolCall {
                id: "tc-1".into(),
                name: "MakeTransform".into(),
                arguments: "{not json".into(),
            },
            ResponseEvent::Done,
        ]]));
        let state = seeded_state(std::path::Path::new("/tmp"));
        let update = invoke_llm(&state, &ctx).await.unwrap();
        assert_eq!(update.turns[0].tool_calls()[0].args, json!({}));
    }

    #[tokio::test]
    async fn invoke_llm_mints_id_for_anonymous_tool_call() {
        let ctx = ctx_with(ScriptedMockProvider::new(vec![vec![
            ResponseEvent::ToolCall {
                id: String::new(),
                name: "MakeTransform".into(),
                arguments: "{}".into(),
            },
            ResponseEvent::Done,
        ]]));
        let state = seeded_state(std::path::Path::new("/tmp"));
        let update = invoke_llm(&state, &ctx).await.unwrap();
        assert!(update.turns[0].tool_calls()[0].id.starts_with("tc-synthetic-"));
    }

    // ── MakeTransform ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn make_transform_persists_source_and_input() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir.path());
        state.turns.push(make_transform_request("tc-1"));

        let update = make_transform(&state, &ctx).await.unwrap();
        let id = update.transform_id.clone().unwrap();
        let store = ArtifactStore::new(dir.path());
        let source = std::fs::read_to_string(store.source_path(&id)).unwrap();
        assert!(source.contains(IDENTITY_CODE));
        assert!(source.contains("\"\"\"\nidentity\n\"\"\""));
        assert_eq!(store.read_input(&id).unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn make_transform_appends_tool_result_then_announcement() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir.path());
        state.turns.push(make_transform_request("tc-7"));

        let update = make_transform(&state, &ctx).await.unwrap();
        assert_eq!(update.turns.len(), 2);
        match &update.turns[0] {
            Turn::Tool { name, call_id, content } => {
                assert_eq!(name, "MakeTransform");
                assert_eq!(call_id, "tc-7");
                let t: Transform = serde_json::from_str(content).unwrap();
                assert_eq!(t.code, IDENTITY_CODE);
            }
            other => panic!("expected tool result, got {other:?}"),
        }
        assert!(update.turns[1].content().contains("Transform created at path:"));
    }

    #[tokio::test]
    async fn make_transform_reuses_existing_id() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir.path());
        state.transform_id = Some("stable-id".into());
        state.turns.push(make_transform_request("tc-1"));

        let update = make_transform(&state, &ctx).await.unwrap();
        assert_eq!(update.transform_id.as_deref(), Some("stable-id"));
    }

    #[tokio::test]
    async fn make_transform_without_tool_call_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir.path());
        state.turns.push(Turn::ai("no tools here"));

        assert!(matches!(
            make_transform(&state, &ctx).await,
            Err(WorkflowError::NoPendingToolCall)
        ));
    }

    #[tokio::test]
    async fn make_transform_with_bad_args_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir.path());
        state.turns.push(Turn::ai_with_tool_calls(
            "",
            vec![ToolCallRequest {
                id: "tc-1".into(),
                name: "MakeTransform".into(),
                args: json!({"code": ""}),
            }],
        ));

        assert!(matches!(
            make_transform(&state, &ctx).await,
            Err(WorkflowError::InvalidTransformArgs(_))
        ));
    }

    #[tokio::test]
    async fn make_transform_into_unwritable_dir_is_artifact_io() {
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(std::path::Path::new("/nonexistent/ferry-test"));
        state.turns.push(make_transform_request("tc-1"));

        assert!(matches!(
            make_transform(&state, &ctx).await,
            Err(WorkflowError::ArtifactIo { .. })
        ));
    }

    // ── TestTransform ─────────────────────────────────────────────────────────

    async fn made_state(dir: &std::path::Path, code: &str) -> WorkflowState {
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir);
        state.turns.push(Turn::ai_with_tool_calls(
            "",
            vec![ToolCallRequest {
                id: "tc-1".into(),
                name: "MakeTransform".into(),
                args: json!({"imports": "", "description": "d", "code": code}),
            }],
        ));
        let update = make_transform(&state, &ctx).await.unwrap();
        state.apply(update);
        state
    }

    #[tokio::test]
    async fn test_transform_round_trips_identity() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let state = made_state(dir.path(), IDENTITY_CODE).await;

        let update = test_transform(&state, &ctx).await.unwrap();
        assert_eq!(update.output, Some(vec![json!({"a": 1})]));

        let id = state.transform_id.as_deref().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.read_output(id).unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_transform_tool_result_uses_synthetic_id() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let state = made_state(dir.path(), IDENTITY_CODE).await;

        let update = test_transform(&state, &ctx).await.unwrap();
        match &update.turns[0] {
            Turn::Tool { name, call_id, content } => {
                assert_eq!(name, "TestTransform");
                assert!(call_id.starts_with("tc-synthetic-"), "{call_id}");
                assert!(content.contains("Result of executing the transform"));
            }
            other => panic!("expected tool result, got {other:?}"),
        }
        assert!(update.turns[1].content().contains("Output written to:"));
    }

    #[tokio::test]
    async fn test_transform_list_result_becomes_documents() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let state = made_state(
            dir.path(),
            "def transform(source_json): return [source_json, {\"extra\": True}]",
        )
        .await;

        let update = test_transform(&state, &ctx).await.unwrap();
        assert_eq!(
            update.output,
            Some(vec![json!({"a": 1}), json!({"extra": true})])
        );
    }

    #[tokio::test]
    async fn failing_transform_leaves_no_output_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let state = made_state(
            dir.path(),
            "def transform(source_json): raise RuntimeError('nope')",
        )
        .await;

        let err = test_transform(&state, &ctx).await.unwrap_err();
        assert!(matches!(err, WorkflowError::TransformExecution(_)), "{err:?}");

        let id = state.transform_id.as_deref().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(!store.output_path(id).exists());
    }

    #[tokio::test]
    async fn test_transform_before_make_is_missing_state() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let state = seeded_state(dir.path());

        assert!(matches!(
            test_transform(&state, &ctx).await,
            Err(WorkflowError::MissingState("transform_id"))
        ));
    }

    #[tokio::test]
    async fn test_transform_with_missing_fixture_is_artifact_io() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with(ScriptedMockProvider::always_text("unused"));
        let mut state = seeded_state(dir.path());
        state.transform_id = Some("never-made".into());

        assert!(matches!(
            test_transform(&state, &ctx).await,
            Err(WorkflowError::ArtifactIo { .. })
        ));
    }
}
