// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a workflow run.  The first stage error ends the
/// run; there is no retry.  The last checkpoint recorded before the failure
/// remains readable through [`crate::CheckpointStore`].
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required state field is absent or empty.
    #[error("state field '{0}' is missing; the caller must supply it before running")]
    MissingState(&'static str),

    /// MakeTransform ran but the most recent AI turn requested no tool call.
    #[error("the most recent AI turn carries no tool-call request")]
    NoPendingToolCall,

    /// The tool-call arguments could not be turned into a transform.
    #[error("invalid transform arguments: {0}")]
    InvalidTransformArgs(String),

    /// Reading or writing a persisted artifact failed.
    #[error("artifact I/O failed for {}", path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted source could not be loaded (syntax error, or no
    /// `transform` function defined).
    #[error("transform source failed to load: {0}")]
    TransformLoad(String),

    /// The generated code raised, timed out, or produced unusable output.
    #[error("transform execution failed: {0}")]
    TransformExecution(String),

    /// The model completion call failed.
    #[error("model completion failed: {0}")]
    Model(String),
}
