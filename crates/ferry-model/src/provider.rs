// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::{CompletionRequest, ResponseEvent};

pub type ResponseStream = Pin<Box<dyn Stream<Item = anyhow::Result<ResponseEvent>> + Send>>;

/// Boundary between the workflow and a generative model service.
///
/// Implementations own transport, authentication, and wire-format concerns;
/// the workflow only ever sees [`ResponseEvent`]s.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Human-readable provider name for status display.
    fn name(&self) -> &str;

    /// Model identifier as reported to users.
    fn model_name(&self) -> &str;

    /// Send a completion request and return the response event stream.
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream>;
}
