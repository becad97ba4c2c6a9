// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
mod schema;
mod loader;

pub use loader::load;
pub use schema::{ClusterConfig, Config, ModelConfig, WorkflowConfig};
