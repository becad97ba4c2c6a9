// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use serde_json::json;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent, Turn};

/// Deterministic mock provider for tests and offline runs.  Echoes the last
/// human turn back as the assistant response.
#[derive(Default)]
pub struct MockProvider;

#[async_trait]
impl crate::ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }
    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let reply = req
            .turns
            .iter()
            .rev()
            .find(|t| matches!(t, Turn::Human { .. }))
            .map(|t| t.content())
            .unwrap_or("[no input]")
            .to_string();

        let events: Vec<anyhow::Result<ResponseEvent>> = vec![
            Ok(ResponseEvent::TextDelta(format!("MOCK: {reply}"))),
            Ok(ResponseEvent::Usage { input_tokens: 10, output_tokens: 10 }),
            Ok(ResponseEvent::Done),
        ];
        Ok(Box::pin(stream::iter(events)))
    }
}

/// A pre-scripted mock provider.  Each call to `complete` pops the next
/// response script from the front of the queue.  This lets tests specify
/// exact event sequences – including tool calls – without network access.
pub struct ScriptedMockProvider {
    scripts: Arc<Mutex<Vec<Vec<ResponseEvent>>>>,
    /// The last `CompletionRequest` seen by this provider.
    /// Written on each `complete()` call so tests can inspect what was sent.
    pub last_request: Arc<Mutex<Option<CompletionRequest>>>,
}

impl ScriptedMockProvider {
    /// Build a provider from a list of response scripts.
    /// The outer `Vec` is the ordered list of calls; the inner `Vec` is the
    /// sequence of [`ResponseEvent`]s emitted for that call.
    pub fn new(scripts: Vec<Vec<ResponseEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Convenience: provider that always returns a single text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        let r = reply.into();
        Self::new(vec![vec![
            ResponseEvent::TextDelta(r),
            ResponseEvent::Usage { input_tokens: 5, output_tokens: 5 },
            ResponseEvent::Done,
        ]])
    }

    /// Convenience: provider whose first reply requests the `MakeTransform`
    /// tool with the given arguments.
    pub fn make_transform(
        call_id: impl Into<String>,
        imports: impl Into<String>,
        description: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let args = json!({
            "imports": imports.into(),
            "description": description.into(),
            "code": code.into(),
        });
        Self::new(vec![vec![
            ResponseEvent::ToolCall {
                id: call_id.into(),
                name: "MakeTransform".into(),
                arguments: args.to_string(),
            },
            ResponseEvent::Done,
        ]])
    }
}

#[async_trait]
impl crate::ModelProvider for ScriptedMockProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }
    fn model_name(&self) -> &str {
        "scripted-mock-model"
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        *self.last_request.lock().unwrap() = Some(req);
        let events = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.is_empty() {
                // Default fallback when all scripts are consumed
                vec![
                    ResponseEvent::TextDelta("[no more scripts]".into()),
                    ResponseEvent::Done,
                ]
            } else {
                scripts.remove(0)
            }
        };
        let wrapped: Vec<anyhow::Result<ResponseEvent>> = events.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(wrapped)))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
