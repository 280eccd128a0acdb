use anyhow::{Context, Result};
use axum::serve;
use qbit_unstaller::api::client::{QbitClient, TorrentApi};
use qbit_unstaller::core::config::Config;
use qbit_unstaller::core::routes::build_router;
use qbit_unstaller::core::startup::{log_settings, probe_version};
use qbit_unstaller::core::state::AppState;
use qbit_unstaller::core::tracing_init::init_tracing;
use qbit_unstaller::metrics::collector::Metrics;
use qbit_unstaller::unstaller::evaluator::Evaluator;
use qbit_unstaller::unstaller::scheduler::Scheduler;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    // An explicit path must exist; the default one is optional
    let (config, config_path) = if args.len() > 1 {
        let path = PathBuf::from(&args[1]);
        let config = Config::from_file(&path)
            .context(format!("Failed to load configuration from '{}'", path.display()))?;
        (config, Some(path))
    } else {
        let path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if path.exists() {
            let config = Config::from_file(&path)
                .context(format!("Failed to load configuration from '{}'", path.display()))?;
            (config, Some(path))
        } else {
            (Config::default(), None)
        }
    };

    init_tracing(&config.logging)?;

    // Build Tokio runtime with configured number of threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match &config_path {
        Some(path) => info!(config_path = %path.display(), "qBittorrent unstaller starting"),
        None => warn!(
            config_path = DEFAULT_CONFIG_PATH,
            "Config file not found, starting with defaults"
        ),
    }

    log_settings(&config);

    let client = Arc::new(
        QbitClient::new(&config.qbittorrent, config.unstaller.stalled_limit)
            .context("Failed to create qBittorrent client")?,
    );

    probe_version(&client).await?;

    let metrics = Arc::new(Metrics::new()?);

    let api: Arc<dyn TorrentApi> = client;
    let evaluator = Evaluator::new(api, Arc::clone(&metrics));
    let scheduler = Scheduler::new(evaluator, config.unstaller.interval(), Arc::clone(&metrics));
    tokio::spawn(scheduler.run());

    // Build the router with middleware
    let app = build_router(Arc::new(AppState::new(metrics)))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                )
        );

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr).await
        .context(format!("Failed to bind TCP listener to {}", addr))?;

    info!(address = %addr, "Serving /metrics, /stats and /health");

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shutting down gracefully");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
