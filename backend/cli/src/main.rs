mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use screentask_core::{Analyzer, TaskError};
use screentask_gateway::{GatewayState, SupabaseAuthenticator};
use screentask_memory::SqliteOutputCache;
use screentask_planner::TaskPipeline;
use screentask_storage::{ScreenshotEnumerator, SupabaseStorage};
use screentask_understanding::{OpenAiVisionProvider, ScreenshotAnalyzer};

use config::Config;

#[derive(Parser)]
#[command(name = "screentask")]
#[command(about = "Turn stored phone screenshots into to-do items")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Max screenshots analyzed at once (0 = unbounded)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Analyze a single image URL and print the result
    Analyze {
        /// Publicly reachable image URL
        url: String,
    },
    /// Run the pipeline for one user and print the tasks
    Tasks {
        /// Storage owner id of the user
        user_id: String,
        /// Max screenshots analyzed at once (0 = unbounded)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Check whether a local server is up
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    match &config.log_dir {
        Some(dir) => screentask_logging::init_logger(dir, &config.log_level),
        None => screentask_logging::init_json_stdout(&config.log_level),
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, concurrency } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                concurrency: concurrency.unwrap_or(config.concurrency),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Analyze { url } => {
            let analyzer = build_analyzer(&config)?;
            let result = analyzer.analyze(&url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Tasks {
            user_id,
            concurrency,
        } => {
            let config = Config {
                concurrency: concurrency.unwrap_or(config.concurrency),
                ..config
            };
            let pipeline = build_pipeline(&config)?;
            let tasks = pipeline.run(&user_id).await?;
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("screentask is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

fn build_analyzer(config: &Config) -> Result<ScreenshotAnalyzer, TaskError> {
    let provider = OpenAiVisionProvider::new(config.openai_api_key()?)
        .with_base_url(&config.openai_base_url);
    Ok(ScreenshotAnalyzer::new(Arc::new(provider))
        .model(&config.model)
        .max_tokens(config.max_tokens))
}

fn build_pipeline(config: &Config) -> Result<TaskPipeline> {
    let storage = SupabaseStorage::new(config.storage_config()?)?;
    let cache = SqliteOutputCache::open(&config.db_path)?;
    let analyzer = build_analyzer(config)?;

    Ok(TaskPipeline::new(
        ScreenshotEnumerator::new(Arc::new(storage)),
        Arc::new(cache),
        Arc::new(analyzer),
    )
    .with_concurrency_limit(config.concurrency))
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        db = %config.db_path,
        model = %config.model,
        concurrency = config.concurrency,
        "Starting screentask"
    );

    let pipeline = build_pipeline(&config)?;
    let storage = config.storage_config()?;
    let authenticator = SupabaseAuthenticator::new(storage.url, storage.service_key);

    let state = Arc::new(GatewayState::new(Arc::new(pipeline), Arc::new(authenticator)));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("Invalid bind address")?;
    screentask_gateway::start_server(addr, state).await
}
