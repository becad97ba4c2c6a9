// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use serde_json::Value;

const INDEX_PROMPT_TEMPLATE: &str = r#"
You are an AI assistant whose goal is to assist users in transfering their data and configuration from an
Elasticsearch or OpenSearch source cluster to an OpenSearch target cluster.

In particular, you are responsible for creating Python code to transform the index-level settings JSON
of the source_version (listed below as source_json) into an equivalent JSON format compatible
with the target_version.

While working towards the goal of creating the Python transformation code, will ALWAYS follow the below
general guidelines:
<guidelines>
- Do not attempt to be friendly in your responses.  Be as direct and succint as possible.
- Think through the problem, extract all data from the task and the previous conversations before creating a plan.
- Never assume any parameter values while invoking a tool or function.
- You may ask clarifying questions to the user if you need more information.
</guidelines>

Additionally, you must ALWAYS follow these code_guidelines for the code you produce:
<code_guidelines>
- Your code MUST NEVER INCLUDE any network calls or I/O operations.
- All code must be Python 3.10+ compatible.
- Ensure any code you provide can be executed with all required imports and variables defined.
- Structure your code to start with the required imports, then a description of the transformation logic,
    and finally the transformation code.
- While you may generate multiple functions to assist in the transformation and make the code more readable,
    the final transformation should be a single function.  It MUST have the following signature:
        `def transform(source_json: Dict[str, Any]) -> Dict[str, Any]:`
</code_guidelines>

The source cluster's version is <source_version>{source_version}</source_version>.

The target cluster's version is <target_version>{target_version}</target_version>.

The index-level settings JSON from the source cluster is:
<source_json>{source_json}</source_json>
"#;

/// System prompt for the transform-index task.
pub fn transform_index_prompt(
    source_version: &str,
    target_version: &str,
    source_json: &Value,
) -> String {
    let rendered = serde_json::to_string_pretty(source_json).unwrap_or_else(|_| source_json.to_string());
    INDEX_PROMPT_TEMPLATE
        .replace("{source_version}", source_version)
        .replace("{target_version}", target_version)
        .replace("{source_json}", &rendered)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prompt_substitutes_versions_and_input() {
        let p = transform_index_prompt(
            "Elasticsearch 6.8",
            "OpenSearch 2.14",
            &json!({"settings": {"index": {"number_of_shards": 1}}}),
        );
        assert!(p.contains("<source_version>Elasticsearch 6.8</source_version>"));
        assert!(p.contains("<target_version>OpenSearch 2.14</target_version>"));
        assert!(p.contains("number_of_shards"));
        assert!(!p.contains("{source_json}"));
    }

    #[test]
    fn prompt_pins_the_transform_signature() {
        let p = transform_index_prompt("a", "b", &json!({}));
        assert!(p.contains("def transform(source_json"));
    }
}
