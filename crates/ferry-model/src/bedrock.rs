// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
//! AWS Bedrock driver — native Converse API with SigV4 authentication.
//!
//! Uses the non-streaming `POST /model/{modelId}/converse` endpoint and wraps
//! the response into the standard `ResponseStream`.  The full SigV4 signing
//! algorithm is implemented locally using `sha2` and `hex` (already workspace
//! dependencies) to avoid pulling in the AWS SDK.
//!
//! # Credentials
//! Reads from env vars:
//! - `AWS_ACCESS_KEY_ID`
//! - `AWS_SECRET_ACCESS_KEY`
//! - `AWS_SESSION_TOKEN` (optional, for temporary credentials)
//! - `AWS_DEFAULT_REGION` or `AWS_REGION` (fallback: `us-west-2`)

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent, Turn};

pub struct BedrockProvider {
    model: String,
    region: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl BedrockProvider {
    pub fn new(
        model: String,
        region: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Self {
        let region = region
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .or_else(|| std::env::var("AWS_REGION").ok())
            .unwrap_or_else(|| "us-west-2".into());
        Self {
            model,
            region,
            max_tokens: max_tokens.unwrap_or(4096),
            temperature: temperature.unwrap_or(0.0),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl crate::ModelProvider for BedrockProvider {
    fn name(&self) -> &str {
        "aws"
    }
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").context("AWS_ACCESS_KEY_ID not set")?;
        let secret_key =
            std::env::var("AWS_SECRET_ACCESS_KEY").context("AWS_SECRET_ACCESS_KEY not set")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();

        let body = build_converse_body(&req, self.max_tokens, self.temperature);
        let body_bytes = serde_json::to_vec(&body)?;
        let url = format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/converse",
            self.region,
            urlencoded(&self.model),
        );

        debug!(model = %self.model, region = %self.region, "sending AWS Bedrock request");

        let now = Utc::now();
        let date_time = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = &date_time[..8];
        let host = format!("bedrock-runtime.{}.amazonaws.com", self.region);
        let content_type = "application/json";
        let service = "bedrock";

        let headers_to_sign: Vec<(&str, &str)> = {
            let mut h = vec![
                ("content-type", content_type),
                ("host", host.as_str()),
                ("x-amz-date", date_time.as_str()),
            ];
            if let Some(tok) = &session_token {
                h.push(("x-amz-security-token", tok.as_str()));
            }
            h.sort_by_key(|&(k, _)| k);
            h
        };

        let canonical_headers: String = headers_to_sign
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k.to_lowercase(), v.trim()))
            .collect();
        let signed_headers: String = headers_to_sign
            .iter()
            .map(|(k, _)| k.to_lowercase())
            .collect::<Vec<_>>()
            .join(";");
        let body_hash = hex_sha256(&body_bytes);

        let path = format!("/model/{}/converse", urlencoded(&self.model));
        let canonical_request = format!(
            "POST\n{}\n\n{}\n{}\n{}",
            path, canonical_headers, signed_headers, body_hash
        );

        let credential_scope = format!("{}/{}/{}/aws4_request", date, self.region, service);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            date_time,
            credential_scope,
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = derive_signing_key(secret_key.as_bytes(), date, &self.region, service);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{},SignedHeaders={},Signature={}",
            access_key, credential_scope, signed_headers, signature
        );

        let mut req_builder = self
            .client
            .post(&url)
            .header("content-type", content_type)
            .header("host", &host)
            .header("x-amz-date", &date_time)
            .header("Authorization", &authorization)
            .body(body_bytes);

        if let Some(tok) = &session_token {
            req_builder = req_builder.header("x-amz-security-token", tok);
        }

        let resp = req_builder
            .send()
            .await
            .context("AWS Bedrock request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("AWS Bedrock error {status}: {text}");
        }

        let response_body: Value = resp
            .json()
            .await
            .context("AWS Bedrock response parse failed")?;

        let events: Vec<anyhow::Result<ResponseEvent>> =
            parse_converse_response(&response_body).into_iter().map(Ok).collect();

        Ok(Box::pin(stream::iter(events)))
    }
}

/// Map the conversation onto the Converse wire format.
///
/// System turns go into the request-level `system` array; tool-call requests
/// become `toolUse` blocks on assistant messages and tool results become
/// `toolResult` blocks on user messages, as the Converse API requires.
fn build_converse_body(req: &CompletionRequest, max_tokens: u32, temperature: f32) -> Value {
    let mut system_parts: Vec<Value> = Vec::new();
    let mut messages: Vec<Value> = Vec::new();

    for turn in &req.turns {
        match turn {
            Turn::System { content } => {
                system_parts.push(json!({ "text": content }));
            }
            Turn::Human { content } => {
                messages.push(json!({
                    "role": "user",
                    "content": [{ "text": content }],
                }));
            }
            Turn::Ai { content, tool_calls } => {
                let mut parts: Vec<Value> = Vec::new();
                if !content.is_empty() {
                    parts.push(json!({ "text": content }));
                }
                for tc in tool_calls {
                    parts.push(json!({
                        "toolUse": {
                            "toolUseId": tc.id,
                            "name": tc.name,
                            "input": tc.args,
                        }
                    }));
                }
                messages.push(json!({ "role": "assistant", "content": parts }));
            }
            Turn::Tool { content, call_id, .. } => {
                messages.push(json!({
                    "role": "user",
                    "content": [{
                        "toolResult": {
                            "toolUseId": call_id,
                            "content": [{ "text": content }],
                        }
                    }],
                }));
            }
        }
    }

    let mut body = json!({
        "messages": messages,
        "inferenceConfig": {
            "maxTokens": max_tokens,
            "temperature": temperature,
        }
    });
    if !system_parts.is_empty() {
        body["system"] = json!(system_parts);
    }
    if !req.tools.is_empty() {
        let tools: Vec<Value> = req
            .tools
            .iter()
            .map(|t| {
                json!({
                    "toolSpec": {
                        "name": t.name,
                        "description": t.description,
                        "inputSchema": { "json": t.parameters },
                    }
                })
            })
            .collect();
        body["toolConfig"] = json!({ "tools": tools });
    }
    body
}

/// Flatten a synchronous Converse response into the event sequence the
/// workflow consumes.
fn parse_converse_response(body: &Value) -> Vec<ResponseEvent> {
    let mut events = Vec::new();

    if let Some(content) = body
        .get("output")
        .and_then(|o| o.get("message"))
        .and_then(|m| m["content"].as_array())
    {
        for part in content {
            if let Some(text) = part["text"].as_str() {
                if !text.is_empty() {
                    events.push(ResponseEvent::TextDelta(text.to_string()));
                }
            }
            if let Some(tu) = part.get("toolUse") {
                let id = tu["toolUseId"].as_str().unwrap_or("").to_string();
                let name = tu["name"].as_str().unwrap_or("").to_string();
                let arguments = serde_json::to_string(&tu["input"]).unwrap_or_default();
                events.push(ResponseEvent::ToolCall { id, name, arguments });
            }
        }
    }

    if let Some(usage) = body.get("usage") {
        events.push(ResponseEvent::Usage {
            input_tokens: usage["inputTokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: usage["outputTokens"].as_u64().unwrap_or(0) as u32,
        });
    }

    events.push(ResponseEvent::Done);
    events
}

// ── SigV4 helpers ─────────────────────────────────────────────────────────────

fn sha256(data: &[u8]) -> Vec<u8> {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// HMAC-SHA256 computed without the `hmac` crate using the raw SHA256 primitive.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    const BLOCK: usize = 64;
    let norm_key = if key.len() > BLOCK {
        sha256(key)
    } else {
        key.to_vec()
    };
    let mut padded = [0u8; BLOCK];
    padded[..norm_key.len()].copy_from_slice(&norm_key);
    let ipad: Vec<u8> = padded.iter().map(|&b| b ^ 0x36).collect();
    let opad: Vec<u8> = padded.iter().map(|&b| b ^ 0x5c).collect();
    let inner = {
        let mut h = Sha256::new();
        h.update(&ipad);
        h.update(data);
        h.finalize().to_vec()
    };
    let mut h = Sha256::new();
    h.update(&opad);
    h.update(&inner);
    h.finalize().to_vec()
}

fn derive_signing_key(secret: &[u8], date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_secret = [b"AWS4", secret].concat();
    let k_date = hmac_sha256(&k_secret, date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Percent-encode everything outside the unreserved set, keeping `/` (it
/// appears in inference profile ids; `:` in model ids must be encoded).
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
