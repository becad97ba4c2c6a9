// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider identifier: "aws" (Bedrock Converse) or "mock".
    pub provider: String,
    /// Model name forwarded to the provider API.
    pub name: String,
    /// AWS region override (also honoured via AWS_DEFAULT_REGION env var).
    pub aws_region: Option<String>,
    /// Maximum tokens to request in a single completion.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0–1.0).
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "aws".into(),
            name: "anthropic.claude-3-5-sonnet-20240620-v1:0".into(),
            aws_region: None,
            max_tokens: Some(4096),
            temperature: Some(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Directory that receives generated transform sources and fixtures.
    /// The CLI falls back to `<data dir>/ferry/transforms` when unset.
    pub transform_files_dir: Option<PathBuf>,
    /// Python interpreter used to execute generated transforms.
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
    /// Wall-clock ceiling for one transform execution, in seconds.
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
}

fn default_python_bin() -> String {
    "python3".into()
}

fn default_exec_timeout_secs() -> u64 {
    30
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            transform_files_dir: None,
            python_bin: default_python_bin(),
            exec_timeout_secs: default_exec_timeout_secs(),
        }
    }
}

/// Target cluster connection details, used only by `ferry apply`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Base URL of the target OpenSearch cluster, e.g. `http://localhost:9200`.
    pub base_url: Option<String>,
    pub username: Option<String>,
    /// Environment variable that holds the password; never store the
    /// password itself in a version-controlled file.
    pub password_env: Option<String>,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_bedrock_claude() {
        let cfg = Config::default();
        assert_eq!(cfg.model.provider, "aws");
        assert!(cfg.model.name.contains("claude"));
    }

    #[test]
    fn default_workflow_uses_python3() {
        let cfg = WorkflowConfig::default();
        assert_eq!(cfg.python_bin, "python3");
        assert_eq!(cfg.exec_timeout_secs, 30);
    }

    #[test]
    fn empty_toml_deserializes_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.model.provider, "aws");
        assert!(cfg.cluster.base_url.is_none());
    }

    #[test]
    fn partial_workflow_section_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [workflow]
            transform_files_dir = "/tmp/transforms"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.workflow.transform_files_dir.as_deref(),
            Some(std::path::Path::new("/tmp/transforms"))
        );
        assert_eq!(cfg.workflow.python_bin, "python3");
    }

    #[test]
    fn cluster_section_round_trips() {
        let cfg: Config = toml::from_str(
            r#"
            [cluster]
            base_url = "http://localhost:29200"
            username = "admin"
            password_env = "FERRY_CLUSTER_PASSWORD"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cluster.base_url.as_deref(), Some("http://localhost:29200"));
        assert_eq!(cfg.cluster.password_env.as_deref(), Some("FERRY_CLUSTER_PASSWORD"));
    }
}
