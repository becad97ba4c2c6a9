// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Candidate config locations, lowest priority first.  Discovered layers are
/// optional; only the explicit `--config` path must exist.
fn discovered_layers() -> Vec<PathBuf> {
    let mut layers = vec![PathBuf::from("/etc/ferry/config.toml")];
    if let Some(home) = dirs::home_dir() {
        layers.push(home.join(".config/ferry/config.toml"));
    }
    layers.push(PathBuf::from(".ferry/config.toml"));
    layers.push(PathBuf::from("ferry.toml"));
    if let Ok(env_path) = std::env::var("FERRY_CONFIG") {
        layers.push(PathBuf::from(env_path));
    }
    layers
}

/// Load configuration by deep-merging every discovered TOML layer, highest
/// priority last, then the explicit `extra` path (the `--config` flag) on top.
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = toml::Table::new();

    for path in discovered_layers() {
        if !path.is_file() {
            continue;
        }
        merge_table(&mut merged, parse_file(&path)?);
    }
    if let Some(path) = extra {
        merge_table(&mut merged, parse_file(path)?);
    }

    Ok(toml::Value::Table(merged).try_into().unwrap_or_default())
}

fn parse_file(path: &Path) -> anyhow::Result<toml::Table> {
    debug!(path = %path.display(), "loading config layer");
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Deep-merge `src` into `dst`.  Tables merge key-by-key; anything else in
/// `src` replaces the existing value.
fn merge_table(dst: &mut toml::Table, src: toml::Table) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(toml::Value::Table(d)), toml::Value::Table(s)) => merge_table(d, s),
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table(s: &str) -> toml::Table {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = table("a = 1");
        merge_table(&mut dst, table("a = 2"));
        assert_eq!(dst["a"].as_integer(), Some(2));
    }

    #[test]
    fn merge_tables_is_recursive() {
        let mut dst = table("[model]\nprovider = \"aws\"\nname = \"x\"");
        merge_table(&mut dst, table("[model]\nname = \"y\""));
        assert_eq!(dst["model"]["provider"].as_str(), Some("aws"));
        assert_eq!(dst["model"]["name"].as_str(), Some("y"));
    }

    #[test]
    fn merge_adds_new_sections() {
        let mut dst = table("[model]\nprovider = \"mock\"");
        merge_table(&mut dst, table("[workflow]\npython_bin = \"python3.12\""));
        assert_eq!(dst["workflow"]["python_bin"].as_str(), Some("python3.12"));
        assert_eq!(dst["model"]["provider"].as_str(), Some("mock"));
    }

    #[test]
    fn scalar_replaced_by_table_takes_the_table() {
        let mut dst = table("cluster = 1");
        merge_table(&mut dst, table("[cluster]\nbase_url = \"http://c\""));
        assert_eq!(dst["cluster"]["base_url"].as_str(), Some("http://c"));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(&path, "[model]\nprovider = \"mock\"\nname = \"m\"").unwrap();
        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.model.provider, "mock");
        assert_eq!(cfg.model.name, "m");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/ferry.toml"))).is_err());
    }
}
