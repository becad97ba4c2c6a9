mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use ferry_cluster::{ClusterClient, ConnectionDetails};
use ferry_core::{
    transform_index_prompt, ArtifactStore, PythonRunner, ToolGated, Workflow, WorkflowContext,
    WorkflowEvent, WorkflowState,
};
use ferry_model::Turn;

use cli::{ApplyArgs, Cli, Commands, RunArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = ferry_config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => run_cmd(args, config).await,
        Commands::Apply(args) => apply_cmd(args, config).await,
    }
}

async fn run_cmd(args: RunArgs, config: ferry_config::Config) -> anyhow::Result<()> {
    let input: Value = {
        let text = std::fs::read_to_string(&args.input)
            .with_context(|| format!("reading {}", args.input.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", args.input.display()))?
    };

    let transform_dir = args
        .transform_dir
        .or(config.workflow.transform_files_dir.clone())
        .or_else(|| dirs::data_local_dir().map(|d| d.join("ferry").join("transforms")))
        .ok_or_else(|| anyhow!("cannot determine a transform files directory"))?;
    std::fs::create_dir_all(&transform_dir)
        .with_context(|| format!("creating {}", transform_dir.display()))?;

    let model: Arc<dyn ferry_model::ModelProvider> =
        Arc::from(ferry_model::from_config(&config.model)?);
    info!(provider = model.name(), model = model.model_name(), "model selected");

    let ctx = WorkflowContext::new(
        model,
        Arc::new(ferry_tools::default_registry()),
        PythonRunner::new(
            config.workflow.python_bin.clone(),
            Duration::from_secs(config.workflow.exec_timeout_secs),
        ),
    );
    let workflow = if args.tool_gated {
        Workflow::new(ctx).with_routing(ToolGated)
    } else {
        Workflow::new(ctx)
    };

    let system_prompt =
        transform_index_prompt(&args.source_version, &args.target_version, &input);
    let mut state = WorkflowState::new(input, &transform_dir);
    state.turns = vec![Turn::system(system_prompt), Turn::human(&args.request)];

    let run_id = args
        .run_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Stream each stage's newest turn to the terminal as the run progresses.
    let (tx, mut rx) = mpsc::channel::<WorkflowEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let WorkflowEvent::StageCompleted { stage, state } = event {
                if let Some(turn) = state.turns.last() {
                    println!("── {stage} ── [{}]", turn.role_label());
                    println!("{}\n", turn.content());
                }
            }
        }
    });

    let final_state = workflow.run(state, &run_id, tx).await?;
    let _ = printer.await;

    let transform_id = final_state
        .transform_id
        .as_deref()
        .unwrap_or("<none>")
        .to_string();
    println!("run {run_id} finished");
    println!("  transform id: {transform_id}");
    if final_state.transform_id.is_some() {
        let store = ArtifactStore::new(&transform_dir);
        println!("  source:       {}", store.source_path(&transform_id).display());
        println!("  output:       {}", store.output_path(&transform_id).display());
    }
    if !final_state.output.is_empty() {
        println!("{}", serde_json::to_string_pretty(&final_state.output)?);
    }

    Ok(())
}

async fn apply_cmd(args: ApplyArgs, config: ferry_config::Config) -> anyhow::Result<()> {
    let document = load_output_document(&args)?;

    let base_url = args
        .cluster_url
        .or(config.cluster.base_url.clone())
        .ok_or_else(|| anyhow!("no cluster base URL; pass --cluster-url or set [cluster].base_url"))?;

    let mut conn = ConnectionDetails::new(base_url);
    if let Some(user) = &config.cluster.username {
        let password = config
            .cluster
            .password_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default();
        conn = conn.with_basic_auth(user, password);
    }

    let client = ClusterClient::new(conn);
    let response = client.create_index(&args.index, Some(&document)).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Resolve the settings document to apply: an explicit file, or a transform's
/// output fixture.  A fixture holding a single-element list unwraps to the
/// element; multiple documents are ambiguous and rejected.
fn load_output_document(args: &ApplyArgs) -> anyhow::Result<Value> {
    let value: Value = if let Some(path) = &args.output_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
    } else if let (Some(id), Some(dir)) = (&args.transform_id, &args.transform_dir) {
        ArtifactStore::new(dir)
            .read_output(id)
            .map_err(|e| anyhow!("{e}"))?
    } else {
        bail!("pass --output-file, or --transform-id with --transform-dir");
    };

    match value {
        Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
        Value::Array(items) => bail!(
            "output fixture holds {} documents; apply expects exactly one",
            items.len()
        ),
        other => Ok(other),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
