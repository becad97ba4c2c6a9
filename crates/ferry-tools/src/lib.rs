// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
mod builtin;
mod registry;
mod tool;
mod transform;

pub use builtin::{MakeTransformTool, TestTransformTool};
pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{Tool, ToolCall, ToolOutput};
pub use transform::Transform;

/// Registry pre-loaded with the tools the migration agent exposes to the model.
pub fn default_registry() -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    reg.register(MakeTransformTool);
    reg.register(TestTransformTool);
    reg
}
