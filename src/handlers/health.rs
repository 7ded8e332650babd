//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::broadcast::ThrottledBroadcaster;
use crate::db::{self, DbPool};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Uptime in seconds
    pub uptime_seconds: i64,
    /// Database status
    pub database: ComponentHealth,
    /// Spawned-but-unfinished pool broadcasts
    pub broadcast_in_flight: usize,
    /// Last block a pool broadcast was triggered for
    pub last_broadcast_block: i64,
    /// Timestamp of the most recent summation record
    pub last_summation_at: Option<DateTime<Utc>>,
}

/// Health status enum
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but operational
    Degraded,
    /// Critical systems failing
    Unhealthy,
}

/// Component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Shared application state for health checks
pub struct AppState {
    /// Database connection pool
    pub db: DbPool,
    /// Application start time
    pub started_at: DateTime<Utc>,
    /// Throttled pool broadcaster (for the in-flight gauge)
    pub broadcaster: Arc<ThrottledBroadcaster>,
}

/// Health check handler
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let now = Utc::now();
    let uptime = (now - state.started_at).num_seconds();

    let database = check_database(&state.db).await;
    let last_summation_at = db::get_last_summation(&state.db)
        .await
        .ok()
        .flatten()
        .map(|s| s.timestamp);

    let status = match database.status {
        HealthStatus::Healthy => HealthStatus::Healthy,
        _ => HealthStatus::Unhealthy,
    };

    let code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            uptime_seconds: uptime,
            database,
            broadcast_in_flight: state.broadcaster.in_flight(),
            last_broadcast_block: state.broadcaster.last_broadcast_block(),
            last_summation_at,
        }),
    )
}

/// Simple liveness probe for load balancers
///
/// GET / (root) health
pub async fn health_simple() -> &'static str {
    "ok"
}

async fn check_database(pool: &DbPool) -> ComponentHealth {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: None,
        },
        Err(e) => ComponentHealth {
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
        },
    }
}
