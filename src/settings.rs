//! Runtime tunables with a TTL-cached snapshot
//!
//! Operator-tunable values (retention windows, whale threshold, detection
//! toggle) live in the `settings` key-value table so they can be changed
//! through the admin surface without a restart. Consumers read them through
//! [`SettingsCache`], which refreshes a cached snapshot at most once per
//! TTL (5 minutes by default). Components may therefore observe a change
//! up to one TTL after it is made; there is no cross-component coherency.

use crate::db::{self, DbPool};
use crate::error::AppResult;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Operator-tunable settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Days to keep canonical delegation records
    pub details_retention_days: i64,
    /// Months to keep summation records
    pub summation_retention_months: i64,
    /// Hours between purge job runs
    pub purge_frequency_hours: i64,
    /// Target width of a summation bucket, in blocks
    pub blocks_per_interval: i64,
    /// Whale detection toggle
    pub whale_detection_enabled: bool,
    /// Whale threshold in TRX (inclusive boundary)
    pub whale_threshold_trx: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            details_retention_days: 30,
            summation_retention_months: 6,
            purge_frequency_hours: 1,
            blocks_per_interval: 100,
            whale_detection_enabled: true,
            whale_threshold_trx: 1_000_000,
        }
    }
}

mod keys {
    pub const DETAILS_RETENTION_DAYS: &str = "details_retention_days";
    pub const SUMMATION_RETENTION_MONTHS: &str = "summation_retention_months";
    pub const PURGE_FREQUENCY_HOURS: &str = "purge_frequency_hours";
    pub const BLOCKS_PER_INTERVAL: &str = "blocks_per_interval";
    pub const WHALE_DETECTION_ENABLED: &str = "whale_detection_enabled";
    pub const WHALE_THRESHOLD_TRX: &str = "whale_threshold_trx";
}

impl Settings {
    /// Read settings from the key-value table. Missing keys fall back to
    /// defaults so a fresh database starts in a working state.
    pub async fn load(pool: &DbPool) -> AppResult<Self> {
        let defaults = Settings::default();
        Ok(Self {
            details_retention_days: read_i64(pool, keys::DETAILS_RETENTION_DAYS)
                .await?
                .unwrap_or(defaults.details_retention_days),
            summation_retention_months: read_i64(pool, keys::SUMMATION_RETENTION_MONTHS)
                .await?
                .unwrap_or(defaults.summation_retention_months),
            purge_frequency_hours: read_i64(pool, keys::PURGE_FREQUENCY_HOURS)
                .await?
                .unwrap_or(defaults.purge_frequency_hours),
            blocks_per_interval: read_i64(pool, keys::BLOCKS_PER_INTERVAL)
                .await?
                .unwrap_or(defaults.blocks_per_interval),
            whale_detection_enabled: read_bool(pool, keys::WHALE_DETECTION_ENABLED)
                .await?
                .unwrap_or(defaults.whale_detection_enabled),
            whale_threshold_trx: read_i64(pool, keys::WHALE_THRESHOLD_TRX)
                .await?
                .unwrap_or(defaults.whale_threshold_trx),
        })
    }

    /// Persist all settings to the key-value table
    pub async fn store(&self, pool: &DbPool) -> AppResult<()> {
        db::set_setting(
            pool,
            keys::DETAILS_RETENTION_DAYS,
            &self.details_retention_days.to_string(),
        )
        .await?;
        db::set_setting(
            pool,
            keys::SUMMATION_RETENTION_MONTHS,
            &self.summation_retention_months.to_string(),
        )
        .await?;
        db::set_setting(
            pool,
            keys::PURGE_FREQUENCY_HOURS,
            &self.purge_frequency_hours.to_string(),
        )
        .await?;
        db::set_setting(
            pool,
            keys::BLOCKS_PER_INTERVAL,
            &self.blocks_per_interval.to_string(),
        )
        .await?;
        db::set_setting(
            pool,
            keys::WHALE_DETECTION_ENABLED,
            &self.whale_detection_enabled.to_string(),
        )
        .await?;
        db::set_setting(
            pool,
            keys::WHALE_THRESHOLD_TRX,
            &self.whale_threshold_trx.to_string(),
        )
        .await?;
        Ok(())
    }

    /// Whale threshold converted to SUN
    pub fn whale_threshold_sun(&self) -> i64 {
        self.whale_threshold_trx * crate::models::SUN_PER_TRX
    }
}

async fn read_i64(pool: &DbPool, key: &str) -> AppResult<Option<i64>> {
    Ok(db::get_setting(pool, key)
        .await?
        .and_then(|v| v.parse().ok()))
}

async fn read_bool(pool: &DbPool, key: &str) -> AppResult<Option<bool>> {
    Ok(db::get_setting(pool, key)
        .await?
        .and_then(|v| v.parse().ok()))
}

#[derive(Debug, Clone, Copy)]
struct CachedSettings {
    settings: Settings,
    fetched_at: DateTime<Utc>,
}

/// TTL-cached settings reader shared by all components
pub struct SettingsCache {
    db: DbPool,
    ttl: Duration,
    cached: RwLock<Option<CachedSettings>>,
}

/// Whether a snapshot fetched at `fetched_at` is stale at `now`
fn is_stale(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - fetched_at >= ttl
}

impl SettingsCache {
    /// Default TTL: 5 minutes
    pub fn new(db: DbPool) -> Self {
        Self::with_ttl(db, Duration::minutes(5))
    }

    pub fn with_ttl(db: DbPool, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Current settings, refreshed from the database if the snapshot is stale
    pub async fn get(&self) -> AppResult<Settings> {
        let now = Utc::now();

        {
            let cached = self.cached.read().await;
            if let Some(entry) = *cached {
                if !is_stale(entry.fetched_at, now, self.ttl) {
                    return Ok(entry.settings);
                }
            }
        }

        let settings = Settings::load(&self.db).await?;
        let mut cached = self.cached.write().await;
        *cached = Some(CachedSettings {
            settings,
            fetched_at: now,
        });
        Ok(settings)
    }

    /// Persist new settings and replace the cached snapshot immediately
    pub async fn update(&self, settings: Settings) -> AppResult<()> {
        settings.store(&self.db).await?;
        let mut cached = self.cached.write().await;
        *cached = Some(CachedSettings {
            settings,
            fetched_at: Utc::now(),
        });
        Ok(())
    }

    /// Drop the cached snapshot so the next read hits the database
    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        *cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use std::path::PathBuf;

    async fn test_pool() -> DbPool {
        let config = DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        };
        let pool = db::init_pool(&config).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_staleness_boundary() {
        let fetched = Utc::now();
        let ttl = Duration::minutes(5);
        assert!(!is_stale(fetched, fetched + Duration::minutes(4), ttl));
        assert!(is_stale(fetched, fetched + Duration::minutes(5), ttl));
    }

    #[tokio::test]
    async fn test_missing_keys_fall_back_to_defaults() {
        let pool = test_pool().await;
        let settings = Settings::load(&pool).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_store_then_load_round_trip() {
        let pool = test_pool().await;
        let settings = Settings {
            details_retention_days: 14,
            summation_retention_months: 3,
            purge_frequency_hours: 2,
            blocks_per_interval: 200,
            whale_detection_enabled: false,
            whale_threshold_trx: 500_000,
        };
        settings.store(&pool).await.unwrap();

        let loaded = Settings::load(&pool).await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_update_replaces_cached_snapshot() {
        let pool = test_pool().await;
        let cache = SettingsCache::with_ttl(pool, Duration::hours(1));

        let initial = cache.get().await.unwrap();
        assert!(initial.whale_detection_enabled);

        let mut updated = initial;
        updated.whale_detection_enabled = false;
        cache.update(updated).await.unwrap();

        // Long TTL: the fresh value must come from the replaced snapshot
        let observed = cache.get().await.unwrap();
        assert!(!observed.whale_detection_enabled);
    }
}
