use clap::{Parser, ValueEnum};
use data_insight_agent::agent::{Agent, AgentOptions};
use data_insight_agent::config::{AppConfig, DEFAULT_SYSTEM_PROMPT};
use data_insight_agent::index::{Embedder, JsonlIndex, OllamaEmbedder, VectorIndex};
use data_insight_agent::ingest;
use data_insight_agent::model::OllamaClient;
use data_insight_agent::tooling::ToolRegistry;
use data_insight_agent::tools::{EdaPlanTool, SearchKbTool};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "data-insight-agent",
    version,
    about = "Retrieval-augmented EDA assistant powered by Ollama"
)]
struct Cli {
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    ollama_url: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    max_turns: Option<usize>,
    #[arg(long)]
    prompt_file: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Agent)]
    mode: RunMode,
    #[arg(long, default_value_t = 3)]
    top_k: usize,
    #[arg(long)]
    topic: Option<String>,
    prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    Agent,
    Search,
    Ingest,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    dotenvy::dotenv().ok();
    info!("Starting data-insight-agent");
    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, system = ?cli.system, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration using default path or defaults");
    }
    if let Some(url) = cli.ollama_url.clone() {
        config.ollama_url = url;
    }
    if let Some(model) = cli.model.clone() {
        config.model = model;
    }

    let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
        config.ollama_url.clone(),
        config.embed_model.clone(),
    ));

    info!(mode = ?cli.mode, "Running in selected mode");
    match cli.mode {
        RunMode::Agent => {
            let prompt = load_prompt(&cli)?;
            let index = load_index(&config.index_path);
            let registry = build_registry(embedder.clone(), index)?;

            let provider = Arc::new(OllamaClient::new(config.ollama_url.clone()));
            let system_prompt = config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
            let agent = Agent::new(provider, registry, config.model.clone(), system_prompt);

            let options = AgentOptions {
                model: None,
                system_prompt: cli.system.clone(),
                max_turns: cli.max_turns.or(config.max_turns),
            };
            let outcome = agent.run(prompt, options).await?;

            let output = json!({
                "response": outcome.response,
                "tool_steps": outcome.steps,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        RunMode::Search => {
            let query = load_prompt(&cli)?;
            let index = load_index(&config.index_path);
            let embedding = embedder.embed(&query).await?;
            let hits = index.query(&embedding, cli.top_k, cli.topic.as_deref()).await?;

            if hits.is_empty() {
                println!("No results.");
            }
            for hit in hits {
                println!(
                    "- [{} / {}] {}",
                    hit.metadata.topic,
                    hit.metadata.source,
                    preview(&hit.text, 200)
                );
            }
        }
        RunMode::Ingest => {
            let count =
                ingest::build_index(&config.kb_dir, &config.index_path, embedder.as_ref()).await?;
            println!("Indexed {count} chunks into {}", config.index_path.display());
        }
    }

    info!("Execution finished");
    Ok(())
}

fn build_registry(
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
) -> Result<Arc<ToolRegistry>, Box<dyn Error>> {
    let mut registry = ToolRegistry::new();
    registry.register(SearchKbTool::spec(embedder, index))?;
    registry.register(EdaPlanTool::spec())?;
    Ok(Arc::new(registry))
}

fn load_index(path: &Path) -> Arc<JsonlIndex> {
    match JsonlIndex::load(path) {
        Ok(index) => Arc::new(index),
        Err(err) => {
            warn!(path = %path.display(), %err, "Vector index unavailable; retrieval will find nothing");
            Arc::new(JsonlIndex::empty())
        }
    }
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        let joined = cli.prompt.join(" ");
        return Ok(normalize_prompt(joined));
    }

    if atty::isnt(atty::Stream::Stdin) {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(normalize_prompt(buffer));
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}

fn preview(text: &str, limit: usize) -> String {
    let flattened = text.trim().replace('\n', " ");
    if flattened.chars().count() <= limit {
        return flattened;
    }
    flattened.chars().take(limit).collect::<String>() + "…"
}
