//! HTTP server initialization and runtime setup.
//!
//! Handles store and cache setup, worker spawning, and the Axum server lifecycle.

use crate::application::workers::{VisitWorkerConfig, run_sweep_scheduler, run_visit_worker};
use crate::config::{Config, StorageBackend};
use crate::infrastructure::cache::{CacheService, MemoryCache, NullCache, RedisCache};
use crate::routes::app_router;
use crate::state::{AppState, Backends};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Time the visit worker gets to flush queued visits after the server stops.
const VISIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Link and visit stores (PostgreSQL with migrations, or in-process)
/// - Cache (Redis, in-process, or none)
/// - Background visit worker and expiry sweep
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let cache = connect_cache(&config).await;

    let backends = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = connect_database(&config).await?;
            Backends::postgres(Arc::new(pool), cache)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; links are lost on restart");
            Backends::memory(cache)
        }
    };

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);

    let worker = tokio::spawn(run_visit_worker(
        visit_rx,
        Arc::new(backends.recorder()),
        VisitWorkerConfig {
            concurrency: config.visit_worker_concurrency,
            max_attempts: config.visit_max_attempts,
        },
    ));

    let sweeper = config.sweep_interval().map(|period| {
        tokio::spawn(run_sweep_scheduler(Arc::new(backends.sweeper()), period))
    });

    let state = AppState::new(
        &backends,
        visit_tx,
        config.base_url.clone(),
        config.cache_ttl_seconds,
    )
    .with_behind_proxy(config.behind_proxy);

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped, flushing visit queue");

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    // The router owned the last sender; the worker exits once the queue is empty.
    if tokio::time::timeout(VISIT_DRAIN_TIMEOUT, worker).await.is_err() {
        tracing::warn!("Visit worker did not finish in time, remaining visits dropped");
    }

    Ok(())
}

async fn connect_database(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres storage backend")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Picks the cache backend.
///
/// Redis when configured and reachable; otherwise the in-process cache,
/// unless `CACHE_MAX_ENTRIES` is `0`.
async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
            }
        }
    }

    if config.cache_max_entries == 0 {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    }

    tracing::info!(
        max_entries = config.cache_max_entries,
        "Cache enabled (in-process)"
    );
    Arc::new(MemoryCache::new(
        config.cache_max_entries,
        config.cache_ttl_seconds,
    ))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
