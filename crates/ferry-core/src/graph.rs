// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use ferry_model::ModelProvider;
use ferry_tools::ToolRegistry;

use crate::{
    stages, CheckpointStore, PythonRunner, StateUpdate, WorkflowError, WorkflowEvent, WorkflowState,
};

/// The nodes of the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageId {
    Validate,
    InvokeLlm,
    MakeTransform,
    TestTransform,
    End,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validate => "validate",
            Self::InvokeLlm => "invoke_llm",
            Self::MakeTransform => "make_transform",
            Self::TestTransform => "test_transform",
            Self::End => "end",
        };
        f.write_str(label)
    }
}

/// Decides which stage follows a completed one.  The driver consults the
/// policy after every merge, so a policy may inspect the updated state.
pub trait RoutingPolicy: Send + Sync {
    fn next(&self, completed: StageId, state: &WorkflowState) -> StageId;
}

/// The production edge set: an unconditional chain through all four stages.
pub struct LinearChain;

impl RoutingPolicy for LinearChain {
    fn next(&self, completed: StageId, _state: &WorkflowState) -> StageId {
        match completed {
            StageId::Validate => StageId::InvokeLlm,
            StageId::InvokeLlm => StageId::MakeTransform,
            StageId::MakeTransform => StageId::TestTransform,
            StageId::TestTransform | StageId::End => StageId::End,
        }
    }
}

/// Predicate-gated variant: proceed to MakeTransform only when the model's
/// last turn actually requested the `MakeTransform` tool; otherwise the run
/// ends after the model reply.
pub struct ToolGated;

impl RoutingPolicy for ToolGated {
    fn next(&self, completed: StageId, state: &WorkflowState) -> StageId {
        match completed {
            StageId::InvokeLlm => match state.pending_tool_call() {
                Some(call) if call.name == "MakeTransform" => StageId::MakeTransform,
                _ => StageId::End,
            },
            other => LinearChain.next(other, state),
        }
    }
}

/// Collaborators shared by every run: the model, the tool registry, and the
/// transform executor.  Built once per process and handed to [`Workflow`] —
/// tests substitute mock providers here instead of patching globals.
#[derive(Clone)]
pub struct WorkflowContext {
    pub model: Arc<dyn ModelProvider>,
    pub tools: Arc<ToolRegistry>,
    pub python: PythonRunner,
}

impl WorkflowContext {
    pub fn new(model: Arc<dyn ModelProvider>, tools: Arc<ToolRegistry>, python: PythonRunner) -> Self {
        Self { model, tools, python }
    }
}

/// The workflow driver.
pub struct Workflow {
    ctx: WorkflowContext,
    routing: Box<dyn RoutingPolicy>,
    checkpoints: CheckpointStore,
}

impl Workflow {
    /// A workflow with the default [`LinearChain`] routing.
    pub fn new(ctx: WorkflowContext) -> Self {
        Self {
            ctx,
            routing: Box::new(LinearChain),
            checkpoints: CheckpointStore::new(),
        }
    }

    pub fn with_routing(mut self, routing: impl RoutingPolicy + 'static) -> Self {
        self.routing = Box::new(routing);
        self
    }

    /// Per-run state snapshots, readable while and after a run executes —
    /// including after a failed run, where the last snapshot shows the state
    /// going into the failing stage.
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Drive `initial` from Validate to End and return the final state.
    ///
    /// One stage runs at a time; after each one the update is merged, the
    /// state is checkpointed under `run_id`, and a snapshot is emitted on
    /// `tx`.  Observer sends are fire-and-forget — a dropped receiver never
    /// affects the run.  The first stage error aborts the run.
    pub async fn run(
        &self,
        initial: WorkflowState,
        run_id: &str,
        tx: mpsc::Sender<WorkflowEvent>,
    ) -> Result<WorkflowState, WorkflowError> {
        let mut state = initial;
        let mut current = StageId::Validate;

        while current != StageId::End {
            debug!(stage = %current, run_id, "entering stage");
            let _ = tx.send(WorkflowEvent::StageStarted { stage: current }).await;

            let update = self.run_stage(current, &state).await?;
            state.apply(update);
            self.checkpoints.record(run_id, &state);

            let _ = tx
                .send(WorkflowEvent::StageCompleted { stage: current, state: state.clone() })
                .await;

            current = self.routing.next(current, &state);
        }

        info!(run_id, "workflow run complete");
        Ok(state)
    }

    async fn run_stage(
        &self,
        stage: StageId,
        state: &WorkflowState,
    ) -> Result<StateUpdate, WorkflowError> {
        match stage {
            StageId::Validate => stages::validate(state),
            StageId::InvokeLlm => stages::invoke_llm(state, &self.ctx).await,
            StageId::MakeTransform => stages::make_transform(state, &self.ctx).await,
            StageId::TestTransform => stages::test_transform(state, &self.ctx).await,
            StageId::End => Ok(StateUpdate::default()),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
