// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A generated data transform: a single Python function mapping one settings
/// document to another, plus its import block and a human-readable
/// description.  Immutable once constructed — a regenerated transform
/// replaces the record rather than mutating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    /// Import statements required by the code body.
    pub imports: String,
    /// What the transformation does, in prose.  Rendered as the module
    /// docstring of the persisted source file.
    pub description: String,
    /// The code body.  Must define `transform(source_json)`.
    pub code: String,
}

impl Transform {
    /// Construct a transform from tool-call arguments.
    ///
    /// Light validation only: all three fields must be present strings and
    /// the code body must be non-empty.  The code is not parsed here — syntax
    /// errors surface later, when the persisted source is loaded for testing.
    pub fn from_args(args: &Value) -> Result<Self, String> {
        let field = |name: &str| -> Result<String, String> {
            args.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| format!("missing or non-string argument '{name}'"))
        };
        let imports = field("imports")?;
        let description = field("description")?;
        let code = field("code")?;
        if code.trim().is_empty() {
            return Err("argument 'code' must not be empty".into());
        }
        Ok(Self { imports, description, code })
    }

    /// Render the persisted source file: imports, the description as a
    /// module docstring, then the code body.
    pub fn to_source(&self) -> String {
        format!(
            "{}\n\n\"\"\"\n{}\n\"\"\"\n\n{}",
            self.imports, self.description, self.code
        )
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn identity_args() -> Value {
        json!({
            "imports": "import json",
            "description": "Returns the input unchanged.",
            "code": "def transform(source_json): return source_json",
        })
    }

    #[test]
    fn from_args_accepts_complete_arguments() {
        let t = Transform::from_args(&identity_args()).unwrap();
        assert_eq!(t.imports, "import json");
        assert!(t.code.starts_with("def transform"));
    }

    #[test]
    fn from_args_rejects_missing_field() {
        let mut args = identity_args();
        args.as_object_mut().unwrap().remove("description");
        let err = Transform::from_args(&args).unwrap_err();
        assert!(err.contains("description"), "{err}");
    }

    #[test]
    fn from_args_rejects_non_string_field() {
        let mut args = identity_args();
        args["imports"] = json!(42);
        assert!(Transform::from_args(&args).is_err());
    }

    #[test]
    fn from_args_rejects_blank_code() {
        let mut args = identity_args();
        args["code"] = json!("   ");
        let err = Transform::from_args(&args).unwrap_err();
        assert!(err.contains("code"), "{err}");
    }

    #[test]
    fn to_source_layout_is_imports_docstring_code() {
        let t = Transform::from_args(&identity_args()).unwrap();
        assert_eq!(
            t.to_source(),
            "import json\n\n\"\"\"\nReturns the input unchanged.\n\"\"\"\n\n\
             def transform(source_json): return source_json"
        );
    }

    #[test]
    fn serializes_to_json_object() {
        let t = Transform::from_args(&identity_args()).unwrap();
        let text = serde_json::to_string(&t).unwrap();
        let back: Transform = serde_json::from_str(&text).unwrap();
        assert_eq!(back, t);
    }
}
