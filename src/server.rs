//! HTTP server initialization and runtime setup.
//!
//! Selects the storage backend, spawns the delete worker, serves the router until a
//! shutdown signal arrives, then drains the delete queue.

use crate::application::services::{IdentityService, ShortenerService};
use crate::config::Config;
use crate::domain::delete_worker::DeleteWorker;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::persistence::{InMemoryLinkRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Opens the storage backend named by the configuration.
///
/// With a DSN the PostgreSQL pool is connected and migrations from `./migrations`
/// are applied; otherwise the in-memory store is rebuilt from its backup log.
///
/// # Errors
///
/// Returns an error if the database is unreachable, a migration fails, or the
/// backup log cannot be opened.
pub async fn open_repository(config: &Config) -> Result<Arc<dyn LinkRepository>> {
    let Some(dsn) = &config.database_url else {
        let repository = InMemoryLinkRepository::open(config.file_storage_path.as_deref())
            .context("Failed to open backup log")?;
        tracing::info!("Using in-memory storage");
        return Ok(Arc::new(repository));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(dsn)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;
    tracing::info!("Migrations applied");

    Ok(Arc::new(PgLinkRepository::with_timeout(
        pool,
        Duration::from_millis(config.db_operation_timeout_ms),
    )))
}

/// Builds the identity service, generating a signing key when none is configured.
///
/// # Errors
///
/// Returns an error if the system RNG is unavailable.
pub fn identity_service(config: &Config) -> Result<IdentityService> {
    if let Some(key) = &config.auth_key {
        return Ok(IdentityService::new(key));
    }

    tracing::warn!(
        "AUTH_KEY not configured, generating a random key; tokens will not survive a restart"
    );
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(|e| anyhow::anyhow!("System RNG unavailable: {e}"))?;
    Ok(IdentityService::new(&hex::encode(bytes)))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage backend (PostgreSQL with migrations, or in-memory with backup log)
/// - Background delete worker
/// - Axum HTTP server with graceful shutdown
///
/// After the listener stops, accepted deletes are drained for at most
/// `shutdown_timeout` seconds.
///
/// # Errors
///
/// Returns an error if:
/// - Storage cannot be opened
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository = open_repository(&config).await?;

    let (delete_queue, delete_worker) = DeleteWorker::spawn(repository.clone());

    let shortener = Arc::new(ShortenerService::new(
        repository,
        config.base_url.clone(),
        delete_queue,
        config.trusted_subnet,
    ));
    let identity = Arc::new(identity_service(&config)?);

    let state = AppState::new(shortener, identity);
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining delete queue");
    let drain = Duration::from_secs(config.shutdown_timeout);
    if tokio::time::timeout(drain, delete_worker.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout,
            "Delete queue did not drain in time"
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
