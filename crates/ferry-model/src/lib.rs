// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
mod types;
mod provider;
mod bedrock;
mod mock;

pub use types::{CompletionRequest, ResponseEvent, ToolCallRequest, ToolSchema, Turn};
pub use provider::{ModelProvider, ResponseStream};
pub use bedrock::BedrockProvider;
pub use mock::{MockProvider, ScriptedMockProvider};

use anyhow::bail;
use ferry_config::ModelConfig;

/// Construct a boxed [`ModelProvider`] from configuration.
///
/// Provider selection:
/// - `"aws"` → [`BedrockProvider`] (Converse API)
/// - `"mock"` → [`MockProvider`] (echo-back, for offline runs and tests)
pub fn from_config(cfg: &ModelConfig) -> anyhow::Result<Box<dyn ModelProvider>> {
    match cfg.provider.as_str() {
        "aws" => Ok(Box::new(BedrockProvider::new(
            cfg.name.clone(),
            cfg.aws_region.clone(),
            cfg.max_tokens,
            cfg.temperature,
        ))),
        "mock" => Ok(Box::new(MockProvider)),
        other => bail!("unknown model provider: {other}"),
    }
}
