// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! REST client for the target search cluster.
//!
//! Used by the surrounding tooling (`ferry apply`) to push a tested
//! transform's output against a live cluster; the workflow core never calls
//! into this crate.
use anyhow::{bail, Context};
use serde_json::Value;
use tracing::info;

/// Connection parameters for one cluster.
#[derive(Debug, Clone)]
pub struct ConnectionDetails {
    /// e.g. `http://localhost:9200`
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConnectionDetails {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Index-level operations against an OpenSearch cluster.
pub struct ClusterClient {
    http: reqwest::Client,
    conn: ConnectionDetails,
}

impl ClusterClient {
    pub fn new(conn: ConnectionDetails) -> Self {
        Self { http: reqwest::Client::new(), conn }
    }

    pub async fn create_index(&self, index_name: &str, settings: Option<&Value>) -> anyhow::Result<Value> {
        info!(index_name, "creating index");
        let mut req = self.http.put(self.conn.endpoint(index_name));
        if let Some(body) = settings {
            req = req.json(body);
        }
        self.send(req).await
    }

    pub async fn describe_index(&self, index_name: &str) -> anyhow::Result<Value> {
        info!(index_name, "describing index");
        self.send(self.http.get(self.conn.endpoint(index_name))).await
    }

    pub async fn update_index(&self, index_name: &str, settings: &Value) -> anyhow::Result<Value> {
        info!(index_name, "updating index settings");
        let req = self
            .http
            .put(self.conn.endpoint(&format!("{index_name}/_settings")))
            .json(settings);
        self.send(req).await
    }

    pub async fn delete_index(&self, index_name: &str) -> anyhow::Result<Value> {
        info!(index_name, "deleting index");
        self.send(self.http.delete(self.conn.endpoint(index_name))).await
    }

    async fn send(&self, mut req: reqwest::RequestBuilder) -> anyhow::Result<Value> {
        if let (Some(user), Some(pass)) = (&self.conn.username, &self.conn.password) {
            req = req.basic_auth(user, Some(pass));
        }
        let resp = req.send().await.context("cluster request failed")?;
        let status = resp.status();
        let body: Value = resp.json().await.context("cluster response parse failed")?;
        if !status.is_success() {
            bail!("cluster error {status}: {body}");
        }
        Ok(body)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
