// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use crate::{StageId, WorkflowState};

/// Events emitted by the driver while a run progresses.
///
/// Consumers (the CLI, tests) subscribe through the mpsc channel passed to
/// [`crate::Workflow::run`].  Emission never affects the run: send failures
/// are ignored, so a dropped receiver simply silences the stream.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A stage is about to execute.
    StageStarted { stage: StageId },
    /// A stage completed and its update was merged; `state` is the snapshot
    /// after the merge.
    StageCompleted { stage: StageId, state: WorkflowState },
}
