// Copyright (c) 2025-2026 Ferry Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ferry",
    about = "LLM-driven migration assistant for Elasticsearch/OpenSearch index settings",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Explicit config file, merged over the discovered layers
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and test a transform for an index-settings document
    Run(RunArgs),
    /// Create the target index from a tested transform's output fixture
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the source index-settings JSON document
    #[arg(long)]
    pub input: PathBuf,

    /// Source cluster version, e.g. "Elasticsearch 6.8"
    #[arg(long)]
    pub source_version: String,

    /// Target cluster version, e.g. "OpenSearch 2.14"
    #[arg(long)]
    pub target_version: String,

    /// Directory for transform sources and fixtures (overrides config)
    #[arg(long)]
    pub transform_dir: Option<PathBuf>,

    /// The human request seeded after the system prompt
    #[arg(long, default_value = "Please make the transform")]
    pub request: String,

    /// Run identifier for checkpoint partitioning (default: random)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Proceed to transform creation only when the model requests it
    #[arg(long)]
    pub tool_gated: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Name of the index to create on the target cluster
    #[arg(long)]
    pub index: String,

    /// Output fixture file to apply
    #[arg(long, conflicts_with = "transform_id")]
    pub output_file: Option<PathBuf>,

    /// Transform id whose output fixture should be applied
    #[arg(long, requires = "transform_dir")]
    pub transform_id: Option<String>,

    /// Directory holding the transform fixtures
    #[arg(long)]
    pub transform_dir: Option<PathBuf>,

    /// Cluster base URL (overrides config)
    #[arg(long)]
    pub cluster_url: Option<String>,
}
