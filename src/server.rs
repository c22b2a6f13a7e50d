//! HTTP server initialization and runtime setup.
//!
//! Wires the database pool, Redis-backed (or in-memory) cache and event buffer,
//! GeoIP handle, click forwarder, flush worker and the Axum server, and tears
//! them down in order on shutdown.

use crate::application::services::{ClickService, ResolveService};
use crate::config::Config;
use crate::domain::click_forwarder::spawn_click_forwarder;
use crate::domain::click_worker::ClickWorker;
use crate::infrastructure::buffer::{EventBuffer, MemoryEventBuffer, RedisEventBuffer};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::enrichment::{Enricher, GeoIp};
use crate::infrastructure::persistence::{
    PgClickRepository, PgDomainRepository, PgLinkRepository,
};
use crate::infrastructure::redis_connection;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Cache and event buffer sharing one Redis connection, or their local
/// fallbacks.
pub struct Backends {
    pub cache: Arc<dyn CacheService>,
    pub buffer: Arc<dyn EventBuffer>,
    pub cache_backend: &'static str,
}

/// Opens the PostgreSQL pool with the configured limits.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.db_idle_timeout)))
        .max_lifetime(Some(Duration::from_secs(config.db_max_lifetime)))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");
    Ok(pool)
}

/// Connects to Redis if configured.
///
/// Without Redis, or if it is unreachable at startup, caching is disabled and
/// click events are buffered in process memory. Buffered events are then lost
/// on restart and not shared between instances.
pub async fn connect_backends(config: &Config) -> Backends {
    let Some(redis_url) = &config.redis_url else {
        info!("Redis not configured: cache disabled, in-memory event buffer");
        return local_backends();
    };

    match redis_connection::connect(redis_url).await {
        Ok(manager) => {
            info!("Cache and event buffer enabled (Redis)");
            Backends {
                cache: Arc::new(RedisCache::new(manager.clone(), config.cache_ttl_seconds)),
                buffer: Arc::new(RedisEventBuffer::new(manager)),
                cache_backend: "redis",
            }
        }
        Err(e) => {
            warn!(
                "Failed to connect to Redis: {}. Using NullCache and in-memory event buffer.",
                e
            );
            local_backends()
        }
    }
}

fn local_backends() -> Backends {
    Backends {
        cache: Arc::new(NullCache::new()),
        buffer: Arc::new(MemoryEventBuffer::new()),
        cache_backend: "disabled",
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis cache and event buffer (or local fallbacks)
/// - GeoIP database (optional)
/// - Click forwarder and flush worker
/// - Axum HTTP server
///
/// On SIGINT/SIGTERM the server stops accepting requests and the click channel
/// is closed. Queued clicks get `SHUTDOWN_TIMEOUT_SECONDS` to reach the buffer
/// before they are abandoned. The worker then runs its final drain and the
/// GeoIP database is closed.
///
/// # Errors
///
/// Returns an error if the database connection, migrations, bind, or server
/// runtime fail.
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let backends = connect_backends(&config).await;

    let geoip = Arc::new(
        GeoIp::from_path(config.geoip_db_path.as_deref()).unwrap_or_else(|e| {
            warn!("{}. Geographic enrichment disabled.", e);
            GeoIp::disabled()
        }),
    );

    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let domain_repository = Arc::new(PgDomainRepository::new(pool.clone()));
    let click_repository = Arc::new(PgClickRepository::new(pool.clone()));

    let resolver = Arc::new(ResolveService::new(
        link_repository,
        domain_repository,
        backends.cache,
        config.resolve_options(),
    ));
    let click_service = Arc::new(ClickService::new(
        backends.buffer.clone(),
        config.enqueue_timeout(),
    ));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    let forwarder = spawn_click_forwarder(click_rx, click_service.clone());

    let worker = ClickWorker::new(
        backends.buffer,
        click_repository,
        Arc::new(Enricher::new(geoip.clone())),
        config.flush_config(),
    )
    .start();

    let state = AppState::new(
        resolver,
        click_service,
        click_tx,
        config.ip_hash_salt.as_str(),
    )
    .behind_proxy(config.behind_proxy)
    .cache_backend(backends.cache_backend);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP server stopped, flushing click pipeline");

    // The router held the last sender; the forwarder ends once the channel is empty.
    let abandoned = forwarder.finish(config.shutdown_timeout()).await;
    if abandoned > 0 {
        warn!(
            abandoned,
            "Click forwarder did not finish within {}s, queued clicks lost",
            config.shutdown_timeout_seconds
        );
    }

    if let Some(report) = worker.stop().await {
        info!(
            read = report.read,
            inserted = report.inserted,
            "Final click flush complete"
        );
    }

    geoip.close();
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler failed: {}. Listening for Ctrl+C only.", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received");
}
