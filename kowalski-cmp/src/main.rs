//! kowalski-cmp - fare-search configuration comparison service
//!
//! Loads bootstrap config, wires the direction store and fare-search client
//! into the comparison service and serves the HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kowalski_cmp::db::PgDirectionStore;
use kowalski_cmp::fetch::ReqwestSearchClient;
use kowalski_cmp::service::ComparisonService;
use kowalski_cmp::{build_router, AppState};
use kowalski_common::config::ConfigResolver;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "kowalski-cmp")]
#[command(about = "Fare-search configuration comparison service")]
#[command(version)]
struct Args {
    /// Path to config file (overrides KOWALSKI_CONFIG and platform defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(long)]
    host: Option<String>,

    /// HTTP port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The configured log level is unknown until the file is read, so config
    // loading logs through a temporary default subscriber
    let resolver = ConfigResolver::new(args.config.clone());
    let mut config = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), || {
        resolver.load()
    })
    .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting kowalski-cmp v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let store = PgDirectionStore::connect_lazy(&config.stats_database_url, &config.core_database_url)
        .context("Failed to configure database pools")?;
    let client = ReqwestSearchClient::new().context("Failed to build HTTP client")?;
    info!(
        base_url = %config.search.base_url,
        timeout_secs = config.search.timeout_secs,
        max_concurrent_fetches = config.search.max_concurrent_fetches,
        "Fare search client ready"
    );

    let service = ComparisonService::new(Arc::new(store), Arc::new(client), config.search.clone());
    let app = build_router(AppState::new(service));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("kowalski-cmp listening on http://{}", addr);
    info!("Health check: http://{}/health-check", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
