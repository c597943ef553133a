//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and the database connection manager
//! - Start the initial connection attempt without blocking
//! - Bind the listener and serve until a termination signal
//!
//! # Design Decisions
//! - Configuration and bind errors are fatal; database errors are not
//! - Subsystems initialize in order, not concurrently

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{self, ServiceConfig, SharedConfig};
use crate::config::watcher::ConfigWatcher;
use crate::database::{ConnectionManager, TcpTransport, Transport};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability;

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration from `path`, or defaults when no path is given.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, StartupError> {
    match path {
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(ServiceConfig::default()),
    }
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(path: Option<&Path>) -> Result<(), StartupError> {
    let initial = load(path)?;
    observability::logging::init(&initial.observability)?;
    observability::panic::install_panic_hook();

    tracing::info!(
        bind_address = %initial.listener.bind_address,
        database_configured = initial.database.resolve_url().is_some(),
        max_retry_attempts = initial.database.max_retry_attempts,
        base_delay_secs = initial.database.base_delay_secs,
        "Configuration loaded"
    );

    if initial.observability.metrics_enabled {
        match initial.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %initial.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shared = config::shared(initial);
    let _watcher = match path {
        Some(path) => match ConfigWatcher::new(path, shared.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Config hot reload unavailable");
                None
            }
        },
        None => None,
    };

    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new());
    serve(shared, transport).await
}

/// Wire the manager and HTTP server around `transport` and serve.
pub async fn serve(shared: SharedConfig, transport: Arc<dyn Transport>) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();

    let manager = ConnectionManager::new(transport, shared.clone());
    let listener_task = manager.start(shutdown.subscribe());
    manager.trigger_connect();

    let bind_address = shared.load().listener.bind_address.clone();
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(AppState {
        manager: manager.clone(),
        config: shared,
    });
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let finished_early = tokio::select! {
        _ = signals::wait_for_termination() => None,
        joined = &mut server_task => Some(joined),
    };
    shutdown.trigger();
    let joined = match finished_early {
        Some(joined) => joined,
        None => server_task.await,
    };
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task aborted"),
    }
    manager.shutdown().await;
    let _ = listener_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
