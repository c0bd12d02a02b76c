use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use filament_core::config::{CyclePolicy, ErrorPolicy, RunConfig};
use filament_core::types::NodeState;
use filament_engine::{execution_order, WorkflowExecutor, WorkflowGraph};
use filament_handlers::HandlerRegistry;
use filament_llm::GeminiClient;

#[derive(Parser)]
#[command(name = "filament", version, about = "Workflow graph execution engine")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "filament.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to the workflow JSON file ({nodes, edges})
        workflow: PathBuf,
        /// API key for the model provider
        #[arg(long, env = "FILAMENT_API_KEY")]
        api_key: Option<String>,
        /// Model id override
        #[arg(long)]
        model: Option<String>,
        /// Stop at the first failed node instead of continuing
        #[arg(long)]
        fail_fast: bool,
        /// Abort if the graph contains a cycle instead of skipping it
        #[arg(long)]
        strict_cycles: bool,
        /// Round-trip one validation request before running
        #[arg(long)]
        validate_key: bool,
        /// Print the full run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a workflow file for structural errors
    Validate {
        /// Path to the workflow JSON file
        workflow: PathBuf,
    },
    /// Print the execution order without running anything
    Order {
        /// Path to the workflow JSON file
        workflow: PathBuf,
    },
    /// Show the effective run configuration
    Config,
}

fn load_graph(path: &Path) -> anyhow::Result<WorkflowGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading workflow file {}", path.display()))?;
    let graph: WorkflowGraph = serde_json::from_str(&content)
        .with_context(|| format!("parsing workflow file {}", path.display()))?;
    Ok(graph)
}

fn load_config(path: &Path) -> RunConfig {
    if path.exists() {
        match RunConfig::load(path) {
            Ok(config) => return config,
            Err(e) => {
                eprintln!("warning: ignoring config {}: {}", path.display(), e);
            }
        }
    }
    RunConfig::default()
}

fn state_glyph(state: NodeState) -> &'static str {
    match state {
        NodeState::Completed => "✓",
        NodeState::Failed => "✗",
        NodeState::Running => "…",
        NodeState::Idle => "·",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("filament=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            workflow,
            api_key,
            model,
            fail_fast,
            strict_cycles,
            validate_key,
            json,
        } => {
            let graph = load_graph(&workflow)?;

            let mut config = load_config(&cli.config);
            if let Some(key) = api_key {
                config.api_key = key;
            }
            if let Some(model) = model {
                config.model_id = model;
            }
            if fail_fast {
                config.error_policy = ErrorPolicy::FailFast;
            }
            if strict_cycles {
                config.cycle_policy = CyclePolicy::Fail;
            }
            if validate_key {
                config.validate_key = true;
            }

            let model_client = Arc::new(GeminiClient::new());
            let registry = Arc::new(HandlerRegistry::with_builtins(model_client.clone()));
            let executor = WorkflowExecutor::new(graph, registry).with_model(model_client);

            info!(workflow = %workflow.display(), "Running workflow");
            let report = executor.execute(&config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for node in executor.graph().nodes() {
                    let state = report.state(&node.id);
                    let detail = report
                        .outcome(&node.id)
                        .and_then(|o| o.error.clone())
                        .unwrap_or_default();
                    println!(
                        "{} {:<20} {:<10} {}",
                        state_glyph(state),
                        node.id,
                        format!("{:?}", state).to_lowercase(),
                        detail
                    );
                }
                if !report.skipped.is_empty() {
                    println!("skipped: {}", report.skipped.join(", "));
                }
                println!(
                    "run {} in {}ms: {}",
                    report.run_id,
                    report.total_elapsed_ms,
                    if report.succeeded { "ok" } else { "failed" }
                );
            }

            if !report.succeeded {
                std::process::exit(1);
            }
        }

        Commands::Validate { workflow } => {
            let graph = load_graph(&workflow)?;
            let schedule = execution_order(&graph);
            println!(
                "{}: {} nodes, {} edges",
                workflow.display(),
                graph.nodes().len(),
                graph.edges().len()
            );
            if schedule.has_cycle() {
                println!("cycle involving: {}", schedule.excluded.join(", "));
                std::process::exit(1);
            }
            println!("ok");
        }

        Commands::Order { workflow } => {
            let graph = load_graph(&workflow)?;
            let schedule = execution_order(&graph);
            for (i, id) in schedule.order.iter().enumerate() {
                println!("{:>3}. {}", i + 1, id);
            }
            if schedule.has_cycle() {
                println!("excluded (cycle): {}", schedule.excluded.join(", "));
            }
        }

        Commands::Config => {
            let config = load_config(&cli.config);
            // Never echo the key itself
            let redacted = RunConfig {
                api_key: if config.api_key.is_empty() {
                    "(unset)".into()
                } else {
                    "********".into()
                },
                ..config
            };
            println!("{}", serde_json::to_string_pretty(&redacted)?);
        }
    }

    Ok(())
}
