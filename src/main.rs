//! tronwatch - TRON delegation event pipeline
//!
//! This is the main entry point for the service. It wires together the
//! observer pipeline, background jobs and the Axum web server.

mod abi;
mod broadcast;
mod cache;
mod config;
mod db;
mod error;
mod handlers;
mod jobs;
mod models;
mod observer;
mod pools;
mod sampler;
mod settings;
mod whale;

use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::broadcast::ThrottledBroadcaster;
use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::handlers::ws::WsState;
use crate::handlers::{ApiState, AppState};
use crate::observer::TransactionObserver;
use crate::pools::{HttpMembershipSource, PoolDelegationTracker, PoolResolver};
use crate::settings::SettingsCache;
use crate::whale::WhaleDetector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting tronwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // Initialize database
    let db_pool = db::init_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;
    tracing::info!("Database initialized");

    // Runtime settings (DB-backed, 5-minute TTL snapshot)
    let settings = Arc::new(SettingsCache::new(db_pool.clone()));

    // Real-time channel
    let ws_state = Arc::new(WsState::new());

    // Throttled pool broadcaster
    let broadcaster = Arc::new(ThrottledBroadcaster::new(db_pool.clone(), ws_state.clone()));

    // Observer pipeline
    let resolver = Arc::new(PoolResolver::new(
        db_pool.clone(),
        config.cache.membership_capacity,
        config.cache.membership_ttl_secs,
    ));
    let tracker = Arc::new(PoolDelegationTracker::new(
        db_pool.clone(),
        resolver.clone(),
        broadcaster.clone(),
        config.chain.block_interval_secs,
    ));
    let whale_detector = Arc::new(WhaleDetector::new(db_pool.clone(), settings.clone()));
    let observer = Arc::new(TransactionObserver::new(
        db_pool.clone(),
        whale_detector,
        tracker,
    ));
    tracing::info!("Observer pipeline initialized");

    // Query cache, TTL bound to the aggregation interval
    let query_cache = Arc::new(QueryCache::new(
        config.cache.query_capacity,
        config.jobs.summation_interval_secs as i64,
    ));

    // Background jobs
    let cancel_token = CancellationToken::new();

    tokio::spawn(jobs::run_summation_job(
        db_pool.clone(),
        ws_state.clone(),
        settings.clone(),
        config.jobs.summation_interval_secs,
        cancel_token.child_token(),
    ));
    tracing::info!("Summation aggregator started");

    if config.jobs.purge_enabled {
        tokio::spawn(jobs::run_purge_job(
            db_pool.clone(),
            settings.clone(),
            cancel_token.child_token(),
        ));
        tracing::info!("Purge job started");
    }

    if config.discovery.enabled {
        let source = Arc::new(HttpMembershipSource::new(&config.discovery.endpoint));
        tokio::spawn(pools::run_discovery_loop(
            db_pool.clone(),
            resolver.clone(),
            source,
            config.discovery.poll_interval_secs,
            cancel_token.child_token(),
        ));
        tracing::info!("Membership discovery loop started");
    }

    // Shared state
    let api_state = Arc::new(ApiState {
        db: db_pool.clone(),
        settings: settings.clone(),
        observer,
        query_cache,
    });

    let app_state = Arc::new(AppState {
        db: db_pool.clone(),
        started_at: Utc::now(),
        broadcaster: broadcaster.clone(),
    });

    // Build router
    let api_routes = Router::new()
        .route("/summations", get(handlers::get_summations))
        .route("/whales/recent", get(handlers::get_recent_whales))
        .route("/pools", get(handlers::get_pools))
        .route("/pools/:address", get(handlers::get_pool_detail))
        .route("/ingest/transaction", post(handlers::ingest_transaction))
        .route("/admin/settings", get(handlers::get_settings))
        .route("/admin/settings", put(handlers::put_settings))
        .route("/admin/cache/clear", post(handlers::clear_query_cache))
        .with_state(api_state);

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(app_state);

    let ws_routes = Router::new()
        .route("/ws", get(handlers::ws_handler))
        .with_state(ws_state);

    let root_routes = Router::new().route("/health", get(handlers::health_simple));

    let app = Router::new()
        .nest("/api/v1", api_routes.merge(health_routes).merge(ws_routes))
        .merge(root_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

/// Wait for Ctrl-C, then cancel background jobs. In-flight broadcasts are
/// allowed to finish or be abandoned; they are best-effort reads.
async fn shutdown_signal(cancel_token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
        return;
    }
    tracing::info!("Shutdown signal received, stopping background jobs");
    cancel_token.cancel();
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tronwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!env!("CARGO_PKG_VERSION").is_empty());
    }
}
