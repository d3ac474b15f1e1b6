//! perfmap-view - Performance Map View Service
//!
//! Backend-for-frontend for the employee-performance-map view of the admin
//! dashboard. Loads the owner's task aggregate once at startup, then keeps
//! submission/review status for the visible page synchronized against the
//! dashboard REST API.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use perfmap_common::events::EventBus;
use perfmap_view::config::{resolve_config, CliOverrides};
use perfmap_view::services::BackendClient;
use perfmap_view::AppState;

#[derive(Debug, Parser)]
#[command(name = "perfmap-view", about = "Performance map view service")]
struct Cli {
    /// Path to TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dashboard API base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Owner whose task aggregate is loaded
    #[arg(long)]
    owner: Option<i64>,

    /// Reviewer identity recorded on review writes
    #[arg(long)]
    reviewer: Option<String>,

    /// HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

impl From<Cli> for CliOverrides {
    fn from(cli: Cli) -> Self {
        CliOverrides {
            config: cli.config,
            backend_url: cli.backend_url,
            owner_id: cli.owner,
            reviewer: cli.reviewer,
            port: cli.port,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli.into())?;

    // Initialize tracing (RUST_LOG wins over the configured level)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting perfmap-view (Performance Map View) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Dashboard API: {}", config.backend_url);

    let client = Arc::new(BackendClient::new(&config.backend_url)?);

    // Load the task aggregate once at mount; the cache augments it from here
    let tasks = client
        .fetch_tasks(config.owner_id)
        .await
        .context("Failed to load task aggregate from dashboard API")?;
    info!(owner_id = config.owner_id, tasks = tasks.len(), "Task aggregate loaded");

    let event_bus = EventBus::new(100);
    let state = AppState::new(client, tasks, config.reviewer, event_bus);

    let app = perfmap_view::build_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.port);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
