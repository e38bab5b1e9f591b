//! gcache - An in-memory LRU cache server for JSON documents
//!
//! Composition root: builds the single cache instance and serves it over HTTP.

use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gcache::{api::create_router, AppState, Config};

/// Main entry point for the gcache server.
///
/// # Startup Sequence
/// 1. Load `.env`, then `config.yml` with environment overrides
/// 2. Initialize tracing (stdout, plus a JSON log file when configured)
/// 3. Create the one cache instance shared by every handler
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables already set in the process win over .env
    let dotenv = dotenvy::dotenv();
    let config = Config::load().context("failed to load configuration")?;

    // The guard flushes buffered file logs on drop, so it lives until main returns
    let (log_writer, _log_guard) = match config.log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // RUST_LOG takes precedence over LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into()))
        .with(fmt::layer())
        .with(log_writer.map(|writer| fmt::layer().json().with_ansi(false).with_writer(writer)))
        .init();

    info!("Starting gcache");
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => debug!("No .env file found"),
        Err(err) => warn!("Unable to load .env file: {}", err),
    }
    match config.file() {
        Some(path) => info!("Read configuration file {}", path.display()),
        None => debug!("No configuration file, using defaults and environment"),
    }
    if let Some(path) = &config.log_file {
        info!("Writing JSON logs to {}", path.display());
    }
    for (name, raw) in config.rejected() {
        warn!("Ignoring invalid {}={:?}, using default", name, raw);
    }
    info!(
        "Configuration loaded: cache_size={}, cache_shards={}, port={}",
        config.cache_size, config.cache_shards, config.port
    );

    let state = AppState::from_config(&config);
    info!(
        "Cache store initialized with {} partition(s)",
        state.cache.shard_count()
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Opens the log file at `path` for appending, creating its directory if needed.
fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("log file {} has no file name", path.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
