//! Haven server entry point.
//!
//! Wires configuration, the PostgreSQL store, the service stack, the
//! background scheduler, and the Axum HTTP server together.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use haven_core::config::HavenConfig;
use haven_core::error::AppError;
use haven_core::traits::{Clock, Mailer, SystemClock};
use haven_service::LogMailer;
use haven_store::pg::{DatabasePool, run_migrations};
use haven_store::{PgStore, Store};
use haven_worker::{CleanupJob, CronScheduler};

#[tokio::main]
async fn main() {
    let env = std::env::var("HAVEN_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match HavenConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber from the logging section.
fn init_tracing(config: &HavenConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_pretty() {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn run(config: HavenConfig) -> Result<(), AppError> {
    tracing::info!("Starting Haven v{}", env!("CARGO_PKG_VERSION"));

    let pool = DatabasePool::connect(&config.database).await?;
    run_migrations(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);

    let addr = config.server.bind_addr();
    let state = haven_api::AppState::assemble(config, store, clock.clone(), mailer);

    let mut scheduler = if state.config.worker.enabled {
        let cleanup = CleanupJob::new(
            state.invitations.clone(),
            state.store.clone(),
            clock,
            state.config.worker.token_retention_days,
        );
        let scheduler = CronScheduler::new(&state.config.worker, cleanup).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Background worker disabled by configuration");
        None
    };

    let grace = state.config.server.shutdown_grace();
    let app = haven_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Haven server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if let Some(scheduler) = scheduler.as_mut() {
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(result) => result?,
            Err(_) => tracing::warn!("Scheduler did not stop within the shutdown grace period"),
        }
    }

    tracing::info!("Haven server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
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
