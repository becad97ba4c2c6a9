// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::WorkflowState;

/// In-memory checkpoint store, partitioned by run id.
///
/// The driver records the merged state after every stage; when a later stage
/// fails, the last recorded snapshot is the caller's diagnostic surface.
/// Clones share the underlying store.
#[derive(Debug, Clone, Default)]
pub struct CheckpointStore {
    inner: Arc<Mutex<HashMap<String, Vec<WorkflowState>>>>,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, run_id: &str, state: &WorkflowState) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entry(run_id.to_string()).or_default().push(state.clone());
    }

    /// The most recent snapshot for the run, if any stage completed.
    pub fn latest(&self, run_id: &str) -> Option<WorkflowState> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(run_id).and_then(|v| v.last().cloned())
    }

    /// All snapshots for the run, oldest first.
    pub fn history(&self, run_id: &str) -> Vec<WorkflowState> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(run_id).cloned().unwrap_or_default()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
