use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linxgo_core::{
    load_config, validate_config, DownloadService, DownloadWorker, Engine, HeaderPolicy,
    InMemoryJobStore, JobStore, StatusPoller, YtDlpEngine,
};
use linxgo_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("LINXGO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Download directory: {:?}", config.downloads.dir);
    info!("Header rules: {}", config.header_rules.len());

    // Create engine. A missing binary is reported per job, so only warn here.
    let engine = YtDlpEngine::new(config.engine.clone());
    match engine.validate().await {
        Ok(()) => info!("Using engine: {} ({:?})", engine.name(), config.engine.ytdlp_path),
        Err(e) => warn!("Engine not available, downloads will fail: {}", e),
    }

    // Create job store
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let header_policy =
        HeaderPolicy::new(&config.header_rules).context("Failed to compile header rules")?;

    // Create worker and submission service
    let worker = DownloadWorker::new(
        Arc::clone(&store),
        Arc::new(engine),
        config.downloads.dir.clone(),
    );

    let mut service = DownloadService::new(Arc::clone(&store), worker, header_policy);
    if let Some(max) = config.downloads.max_concurrent {
        info!("Limiting concurrent downloads to {}", max);
        service = service.with_max_concurrent(max);
    }

    let poller = StatusPoller::new(store, config.downloads.poll_interval());

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), service, poller));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
