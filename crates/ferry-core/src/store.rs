// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::WorkflowError;

/// File-based persistence for a transform's source and fixtures.
///
/// Paths are deterministic per id.  The source file keeps a `.json` extension
/// even though it holds Python — a naming artifact preserved for
/// compatibility with existing tooling.  Writes are whole-file overwrites;
/// reading an artifact that was never written fails with not-found.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn source_path(&self, transform_id: &str) -> PathBuf {
        self.dir.join(format!("{transform_id}.json"))
    }

    pub fn input_path(&self, transform_id: &str) -> PathBuf {
        self.dir.join(format!("{transform_id}_input.json"))
    }

    pub fn output_path(&self, transform_id: &str) -> PathBuf {
        self.dir.join(format!("{transform_id}_output.json"))
    }

    /// Write the rendered source; returns the path written.
    pub fn write_source(&self, transform_id: &str, source: &str) -> Result<PathBuf, WorkflowError> {
        let path = self.source_path(transform_id);
        write_file(&path, source.as_bytes())?;
        Ok(path)
    }

    /// Persist the input document, pretty-printed; returns the path written.
    pub fn write_input(&self, transform_id: &str, input: &Value) -> Result<PathBuf, WorkflowError> {
        let path = self.input_path(transform_id);
        write_file(&path, pretty(input).as_bytes())?;
        Ok(path)
    }

    pub fn read_input(&self, transform_id: &str) -> Result<Value, WorkflowError> {
        read_json(&self.input_path(transform_id))
    }

    /// Persist the output document, pretty-printed; returns the path written.
    pub fn write_output(&self, transform_id: &str, output: &Value) -> Result<PathBuf, WorkflowError> {
        let path = self.output_path(transform_id);
        write_file(&path, pretty(output).as_bytes())?;
        Ok(path)
    }

    pub fn read_output(&self, transform_id: &str) -> Result<Value, WorkflowError> {
        read_json(&self.output_path(transform_id))
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), WorkflowError> {
    std::fs::write(path, bytes).map_err(|source| WorkflowError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Value, WorkflowError> {
    let text = std::fs::read_to_string(path).map_err(|source| WorkflowError::ArtifactIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| WorkflowError::ArtifactIo {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
