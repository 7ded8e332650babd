//! REST API handlers for tronwatch
//!
//! Provides endpoints for:
//! - Summations: sampled chart data over a named period
//! - Whales: recent whale delegations
//! - Pools: pool-attributed aggregate volume and member lists
//! - Ingest: transaction feed from the block-sync pipeline
//! - Admin: runtime settings and cache clearing

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{summations_key, QueryCache};
use crate::db::{self, DbPool, PoolMemberVolume, PoolVolume};
use crate::error::{AppError, AppResult};
use crate::models::{ResourceType, Transaction, WhaleDelegation};
use crate::observer::{IngestOutcome, TransactionObserver};
use crate::sampler::{self, SampleMetadata};
use crate::settings::{Settings, SettingsCache};

/// Stored base unit -> human chart unit divisor
const CHART_UNIT_DIVISOR: f64 = 1e12;

/// Hard cap on requested chart points
const MAX_POINTS: usize = 500;

/// Hard cap on /whales/recent limit
const MAX_WHALE_LIMIT: i64 = 100;

/// Hard cap on trailing pool windows (one week)
const MAX_POOL_WINDOW_HOURS: i64 = 168;

// =============================================================================
// API STATE
// =============================================================================

/// Shared state for API handlers
pub struct ApiState {
    pub db: DbPool,
    pub settings: Arc<SettingsCache>,
    pub observer: Arc<TransactionObserver>,
    pub query_cache: Arc<QueryCache<SummationsResponse>>,
}

// =============================================================================
// SUMMATIONS API
// =============================================================================

/// Query parameters for sampled summations
#[derive(Debug, Deserialize)]
pub struct SummationsQuery {
    /// Named period: 1d, 7d, 30d, 6m
    #[serde(default = "default_period")]
    pub period: String,
    /// Requested chart points
    #[serde(default = "default_points")]
    pub points: usize,
}

fn default_period() -> String {
    "1d".to_string()
}

fn default_points() -> usize {
    60
}

/// One chart point, scaled to human units (base unit / 1e12, one decimal)
#[derive(Debug, Clone, Serialize)]
pub struct ChartBucket {
    pub timestamp: DateTime<Utc>,
    pub energy_delegated: f64,
    pub energy_reclaimed: f64,
    pub bandwidth_delegated: f64,
    pub bandwidth_reclaimed: f64,
    pub net_energy: f64,
    pub net_bandwidth: f64,
    pub transaction_count: f64,
}

/// Response for sampled summations
#[derive(Debug, Clone, Serialize)]
pub struct SummationsResponse {
    pub period: String,
    pub buckets: Vec<Option<ChartBucket>>,
    pub metadata: SampleMetadata,
}

fn parse_period(period: &str) -> AppResult<Duration> {
    match period {
        "1d" => Ok(Duration::days(1)),
        "7d" => Ok(Duration::days(7)),
        "30d" => Ok(Duration::days(30)),
        "6m" => Ok(Duration::days(180)),
        other => Err(AppError::Validation(format!(
            "unknown period '{}' (expected 1d, 7d, 30d or 6m)",
            other
        ))),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn scale(value: f64) -> f64 {
    round1(value / CHART_UNIT_DIVISOR)
}

/// Sampled chart data over a named period
///
/// GET /summations?period=7d&points=60
pub async fn get_summations(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<SummationsQuery>,
) -> Result<Json<SummationsResponse>, AppError> {
    let window = parse_period(&params.period)?;
    if params.points == 0 {
        return Err(AppError::Validation("points must be at least 1".to_string()));
    }
    let points = params.points.min(MAX_POINTS);

    let key = summations_key(&params.period, points);
    if let Some(cached) = state.query_cache.get(&key) {
        return Ok(Json(cached));
    }

    let end = Utc::now();
    let start = end - window;
    let records = db::get_summations_between(&state.db, start, end).await?;
    let series = sampler::sample(&records, points, start, end)?;

    let buckets = series
        .buckets
        .into_iter()
        .map(|bucket| {
            bucket.map(|b| ChartBucket {
                timestamp: b.bucket_start,
                energy_delegated: scale(b.energy_delegated),
                energy_reclaimed: scale(b.energy_reclaimed),
                bandwidth_delegated: scale(b.bandwidth_delegated),
                bandwidth_reclaimed: scale(b.bandwidth_reclaimed),
                net_energy: scale(b.net_energy),
                net_bandwidth: scale(b.net_bandwidth),
                transaction_count: round1(b.transaction_count),
            })
        })
        .collect();

    let response = SummationsResponse {
        period: params.period.clone(),
        buckets,
        metadata: series.metadata,
    };

    state.query_cache.insert(key, response.clone());
    Ok(Json(response))
}

// =============================================================================
// WHALES API
// =============================================================================

/// Query parameters for recent whales
#[derive(Debug, Deserialize)]
pub struct WhalesQuery {
    #[serde(default = "default_whale_limit")]
    pub limit: i64,
    /// 0 = bandwidth, 1 = energy
    pub resource_type: Option<i64>,
}

fn default_whale_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct WhalesResponse {
    pub whales: Vec<WhaleDelegation>,
    pub total: usize,
}

/// Recent whale delegations, most recent first
///
/// GET /whales/recent?limit=20&resource_type=1
pub async fn get_recent_whales(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<WhalesQuery>,
) -> Result<Json<WhalesResponse>, AppError> {
    if params.limit < 1 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }
    let limit = params.limit.min(MAX_WHALE_LIMIT);

    let resource_type = params
        .resource_type
        .map(|code| {
            ResourceType::from_code(code).ok_or_else(|| {
                AppError::Validation(format!("unknown resource_type {}", code))
            })
        })
        .transpose()?;

    let whales = db::recent_whales(&state.db, limit, resource_type).await?;
    let total = whales.len();

    Ok(Json(WhalesResponse { whales, total }))
}

// =============================================================================
// POOLS API
// =============================================================================

/// Query parameters for pool aggregates
#[derive(Debug, Deserialize)]
pub struct PoolsQuery {
    #[serde(default = "default_pool_hours")]
    pub hours: i64,
}

fn default_pool_hours() -> i64 {
    24
}

#[derive(Debug, Serialize)]
pub struct PoolsResponse {
    pub window_hours: i64,
    pub pools: Vec<PoolVolume>,
}

fn validate_hours(hours: i64) -> AppResult<i64> {
    if hours < 1 {
        return Err(AppError::Validation("hours must be at least 1".to_string()));
    }
    Ok(hours.min(MAX_POOL_WINDOW_HOURS))
}

/// Pool-attributed aggregate volume over a trailing window
///
/// GET /pools?hours=24
pub async fn get_pools(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<PoolsQuery>,
) -> Result<Json<PoolsResponse>, AppError> {
    let hours = validate_hours(params.hours)?;
    let cutoff = Utc::now() - Duration::hours(hours);

    let pools = db::pool_volumes_since(&state.db, cutoff).await?;

    Ok(Json(PoolsResponse {
        window_hours: hours,
        pools,
    }))
}

#[derive(Debug, Serialize)]
pub struct PoolDetailResponse {
    pub pool_address: String,
    pub window_hours: i64,
    pub total_normalized_trx: f64,
    pub delegation_count: i64,
    pub members: Vec<PoolMemberVolume>,
}

/// Member breakdown for one pool over a trailing window
///
/// GET /pools/:address?hours=24
pub async fn get_pool_detail(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
    Query(params): Query<PoolsQuery>,
) -> Result<Json<PoolDetailResponse>, AppError> {
    let hours = validate_hours(params.hours)?;
    let cutoff = Utc::now() - Duration::hours(hours);

    let members = db::pool_member_volumes_since(&state.db, &address, cutoff).await?;
    if members.is_empty() {
        return Err(AppError::NotFound(format!(
            "no delegations for pool {} in the last {} hours",
            address, hours
        )));
    }

    let total_normalized_trx = members.iter().map(|m| m.total_normalized_trx).sum();
    let delegation_count = members.iter().map(|m| m.delegation_count).sum();

    Ok(Json(PoolDetailResponse {
        pool_address: address,
        window_hours: hours,
        total_normalized_trx,
        delegation_count,
        members,
    }))
}

// =============================================================================
// INGEST API
// =============================================================================

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: IngestOutcome,
    pub tx_id: String,
}

/// Feed one parsed transaction into the observer
///
/// POST /ingest/transaction
pub async fn ingest_transaction(
    State(state): State<Arc<ApiState>>,
    Json(tx): Json<Transaction>,
) -> Result<Json<IngestResponse>, AppError> {
    if tx.tx_id.is_empty() {
        return Err(AppError::Validation("tx_id must not be empty".to_string()));
    }

    let status = state.observer.process(&tx).await?;
    Ok(Json(IngestResponse {
        status,
        tx_id: tx.tx_id,
    }))
}

// =============================================================================
// ADMIN API
// =============================================================================

/// Current runtime settings
///
/// GET /admin/settings
pub async fn get_settings(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.settings.get().await?;
    Ok(Json(settings))
}

/// Replace runtime settings
///
/// PUT /admin/settings
pub async fn put_settings(
    State(state): State<Arc<ApiState>>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    if settings.details_retention_days < 1
        || settings.summation_retention_months < 1
        || settings.purge_frequency_hours < 1
        || settings.blocks_per_interval < 1
        || settings.whale_threshold_trx < 1
    {
        return Err(AppError::Validation(
            "settings values must be positive".to_string(),
        ));
    }

    state.settings.update(settings).await?;
    tracing::info!(?settings, "Runtime settings updated");
    Ok(Json(settings))
}

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

/// Clear all cached sampling-query responses
///
/// POST /admin/cache/clear
pub async fn clear_query_cache(
    State(state): State<Arc<ApiState>>,
) -> Json<CacheClearResponse> {
    let cleared = state.query_cache.invalidate_prefix("summations:");
    tracing::info!(cleared = cleared, "Query cache cleared by admin action");
    Json(CacheClearResponse { cleared })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("1d").unwrap(), Duration::days(1));
        assert_eq!(parse_period("6m").unwrap(), Duration::days(180));
        assert!(parse_period("2w").is_err());
    }

    #[test]
    fn test_scale_rounds_to_one_decimal() {
        // 2.35e12 base units -> 2.4 chart units
        assert_eq!(scale(2.35e12), 2.4);
        assert_eq!(scale(0.0), 0.0);
    }

    #[test]
    fn test_hours_cap() {
        assert_eq!(validate_hours(24).unwrap(), 24);
        assert_eq!(validate_hours(10_000).unwrap(), MAX_POOL_WINDOW_HOURS);
        assert!(validate_hours(0).is_err());
    }
}
