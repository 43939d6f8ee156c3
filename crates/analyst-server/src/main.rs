//! Stock analyst HTTP service

use analyst_jobs::{JobStore, MemoryJobStore, RedisJobStore, RedisStoreConfig, StoreConfig};
use analyst_llm::{LlmSettings, ModelGateway};
use analyst_pipeline::{
    AnalystTaskRunner, LogReportSink, Orchestrator, PipelineConfig, YahooProvider,
};
use analyst_prompt::PromptCatalog;
use analyst_server::{AppState, ServerConfig, build_router};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "analyst-server")]
#[command(version, about = "Multi-analyst stock analysis service", long_about = None)]
struct Args {
    /// Listen address, overrides API_HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides API_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Redis URL for the job store, overrides REDIS_URL
    #[arg(long)]
    redis_url: Option<String>,

    /// Keep jobs in process memory instead of Redis
    #[arg(long)]
    memory_store: bool,
}

/// Redis when configured and reachable, otherwise the in-memory store
async fn open_store(redis_url: Option<&str>, config: StoreConfig) -> Arc<dyn JobStore> {
    let Some(url) = redis_url else {
        info!("Using in-memory job store");
        return Arc::new(MemoryJobStore::new(config));
    };
    match RedisJobStore::connect(RedisStoreConfig::new(url, config)).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Redis job store unavailable ({}), falling back to memory", e);
            Arc::new(MemoryJobStore::new(config))
        }
    }
}

fn spawn_cleanup(store: Arc<dyn JobStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            match store.cleanup_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Removed {} expired jobs", n),
                Err(e) => warn!("Job cleanup failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    analyst_utils::load_dotenv();
    analyst_utils::init_tracing();

    let args = Args::parse();
    let mut config = ServerConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.redis_url {
        config.redis_url = Some(url);
    }
    if args.memory_store {
        config.redis_url = None;
    }

    info!("Starting analyst-server v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(config.redis_url.as_deref(), StoreConfig::from_env()).await;
    spawn_cleanup(Arc::clone(&store));

    let llm = LlmSettings::from_env();
    let gateway = ModelGateway::from_settings(&llm).context("no usable model provider")?;
    let pipeline = PipelineConfig::from_env()?;
    let catalog = PromptCatalog::new(pipeline.language)?;
    let data = YahooProvider::new()?;

    let runner = AnalystTaskRunner::new(Arc::new(gateway), Arc::new(catalog));
    let orchestrator = Orchestrator::new(store, Arc::new(data), Arc::new(runner), pipeline)
        .with_sink(Arc::new(LogReportSink));

    let app = build_router(AppState::new(orchestrator, llm)).layer(config.cors_layer());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
