use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm::OpenAiAgent;
use orchestrator::{AgentSet, EngineConfig, Orchestrator, OutputFormat};
use sandbox::LocalExecutor;

const CONFIG_FILE: &str = "datadrill.toml";
const API_KEY_ENV: &str = "OPENAI_API_KEY";
const HELPER_MODULE: &str = "helpers";

#[derive(Parser)]
#[command(name = "datadrill")]
#[command(about = "LLM-driven iterative data exploration", long_about = None)]
#[command(version)]
struct Cli {
    /// Seed questions; each starts one exploration branch.
    #[arg(short, long = "seed", required = true)]
    seeds: Vec<String>,

    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured maximum tree depth.
    #[arg(long)]
    max_depth: Option<u32>,

    /// Override the configured branching factor.
    #[arg(long)]
    branching_factor: Option<u32>,

    /// Write the resulting task tree as JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DrillConfig {
    llm: LlmSection,
    sandbox: SandboxSection,
    engine: EngineSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LlmSection {
    endpoint: Option<String>,
    query_model: String,
    analyst_model: String,
    instructor_model: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            query_model: "gpt-4o-2024-08-06".to_string(),
            analyst_model: "gpt-4o-mini".to_string(),
            instructor_model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SandboxSection {
    work_dir: PathBuf,
    interpreter: String,
    timeout_secs: u64,
    /// Optional python helper file installed into the sandbox as `helpers.py`.
    helper_path: Option<PathBuf>,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("coding"),
            interpreter: "python3".to_string(),
            timeout_secs: 60,
            helper_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EngineSection {
    max_depth: u32,
    branching_factor: u32,
    max_conversation_turns: u32,
    call_timeout_secs: u64,
    output_format: OutputFormat,
    schema_path: Option<PathBuf>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_depth: 2,
            branching_factor: 2,
            max_conversation_turns: 10,
            call_timeout_secs: 120,
            output_format: OutputFormat::default(),
            schema_path: None,
        }
    }
}

fn load_config(path: &Path) -> Result<DrillConfig> {
    if !path.exists() {
        return Ok(DrillConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn build_agent(section: &LlmSection, api_key: &str, model: &str) -> Arc<OpenAiAgent> {
    let mut agent = OpenAiAgent::new(api_key, model);
    if let Some(endpoint) = &section.endpoint {
        agent = agent.with_endpoint(endpoint);
    }
    Arc::new(agent)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let api_key = std::env::var(API_KEY_ENV)
        .with_context(|| format!("{API_KEY_ENV} must be set"))?;

    let agents = AgentSet {
        query: build_agent(&config.llm, &api_key, &config.llm.query_model),
        analyst: build_agent(&config.llm, &api_key, &config.llm.analyst_model),
        instructor: build_agent(&config.llm, &api_key, &config.llm.instructor_model),
    };

    let mut executor = LocalExecutor::new(&config.sandbox.work_dir)
        .with_interpreter(&config.sandbox.interpreter)
        .with_timeout(Duration::from_secs(config.sandbox.timeout_secs));
    if let Some(helper_path) = &config.sandbox.helper_path {
        let source = std::fs::read_to_string(helper_path)
            .with_context(|| format!("Failed to read helper file {}", helper_path.display()))?;
        executor = executor.with_prelude(HELPER_MODULE, source);
    }

    let mut engine_config = EngineConfig::new()
        .with_max_depth(cli.max_depth.unwrap_or(config.engine.max_depth))
        .with_branching_factor(
            cli.branching_factor
                .unwrap_or(config.engine.branching_factor),
        )
        .with_max_conversation_turns(config.engine.max_conversation_turns)
        .with_call_timeout(Duration::from_secs(config.engine.call_timeout_secs))
        .with_output_format(config.engine.output_format);
    if let Some(schema_path) = &config.engine.schema_path {
        let schema = std::fs::read_to_string(schema_path)
            .with_context(|| format!("Failed to read schema file {}", schema_path.display()))?;
        engine_config = engine_config.with_schema_context(schema);
    }

    let engine = Orchestrator::new(agents, Arc::new(executor), engine_config);
    let tree = engine
        .run(cli.seeds)
        .await
        .context("Exploration run failed")?;

    tracing::info!(
        layers = tree.depth(),
        tasks = tree.total_tasks(),
        "Run complete"
    );

    let json = serde_json::to_string_pretty(&tree).context("Failed to serialize task tree")?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Task tree written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
