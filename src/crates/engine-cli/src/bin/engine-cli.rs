//! Loads a workflow configuration file, runs it through the execution
//! engine, and prints the resulting summary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use engine::{load_workflow_config, Engine, LlmNodeExecutor, LoggingCallbacks, TaskRegistry};
use llm::config::RemoteLlmConfig;
use llm::remote::OpenAiClient;
use llm::{ChatModel, StubChatModel};

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(about = "Run a tree-shaped workflow through the execution engine", long_about = None)]
#[command(version = engine_cli::version::VERSION)]
struct Cli {
    /// Path to a workflow configuration file (.yaml, .yml, .json, or .toml)
    workflow: PathBuf,

    /// Execution id to register with the task registry
    #[arg(long, default_value_t = 1)]
    execution_id: i64,
}

fn build_chat_model() -> Box<dyn ChatModel> {
    match RemoteLlmConfig::from_env("OPENAI_API_KEY", "https://api.openai.com/v1", "gpt-4o-mini")
    {
        Ok(config) => {
            tracing::info!("using OpenAI chat model from OPENAI_API_KEY");
            Box::new(OpenAiClient::new(config))
        }
        Err(_) => {
            tracing::warn!("OPENAI_API_KEY not set, falling back to the offline stub model");
            Box::new(StubChatModel::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = load_workflow_config(&cli.workflow)?;
    let graph = config.build_graph()?;

    let executor = Arc::new(LlmNodeExecutor::new(build_chat_model()));
    let callbacks = Arc::new(LoggingCallbacks);
    let registry = Arc::new(TaskRegistry::new());

    let engine = Engine::new(graph, executor, callbacks, registry);
    let summary = engine
        .execute_workflow(&config.workflow_id, &config.workflow_name, cli.execution_id)
        .await;

    println!(
        "workflow '{}' finished: completed={} failed={} skipped={} cancelled={} success_rate={:.2}",
        summary.workflow_name,
        summary.completed_count,
        summary.failed_count,
        summary.skipped_count,
        summary.cancelled_count,
        summary.success_rate()
    );
    if let Some(error) = &summary.error_message {
        println!("error: {error}");
    }
    for (node_id, output) in &summary.results {
        println!("  {node_id}: {}", output.as_condition_text());
    }

    Ok(())
}
