//! Pool membership resolver
//!
//! Maps (account, permission id) to the pool address controlling it, if
//! any. Lookups go through an LRU cache with TTL; a missing membership row
//! is a normal state and is cached as a negative entry so repeated lookups
//! for non-pool accounts stay cheap. The resolver only reads memberships;
//! the discovery loop writes them.

use crate::db::{self, DbPool};
use crate::error::AppResult;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

#[derive(Clone)]
struct CachedLookup {
    /// None = known non-member
    pool: Option<String>,
    cached_at: DateTime<Utc>,
}

pub struct PoolResolver {
    db: DbPool,
    cache: Mutex<LruCache<String, CachedLookup>>,
    ttl: Duration,
}

impl PoolResolver {
    pub fn new(db: DbPool, capacity: usize, ttl_seconds: i64) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(4096).unwrap());
        Self {
            db,
            cache: Mutex::new(LruCache::new(cap)),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    fn cache_key(account: &str, permission_id: i64) -> String {
        format!("{}:{}", account, permission_id)
    }

    /// Pool address controlling `account` under `permission_id`, or None
    /// when the account is not (yet) known to be pool-controlled.
    pub async fn get_pool_for_account(
        &self,
        account: &str,
        permission_id: i64,
    ) -> AppResult<Option<String>> {
        let key = Self::cache_key(account, permission_id);

        {
            let mut cache = self.cache.lock();
            if let Some(entry) = cache.get(&key) {
                if Utc::now() - entry.cached_at < self.ttl {
                    return Ok(entry.pool.clone());
                }
                cache.pop(&key);
            }
        }

        let membership = db::get_pool_membership(&self.db, account, permission_id).await?;
        let pool = membership.map(|m| m.pool);

        if pool.is_some() {
            // Membership is in active use; refresh its last_seen marker.
            // Best-effort: a failed touch must not fail the lookup.
            if let Err(e) = db::touch_pool_membership(&self.db, account, permission_id).await {
                tracing::warn!(error = %e, account = account, "Failed to refresh membership last_seen");
            }
        }

        let mut cache = self.cache.lock();
        cache.put(
            key,
            CachedLookup {
                pool: pool.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(pool)
    }

    /// Drop a cached lookup (used when discovery writes a new membership)
    pub fn invalidate(&self, account: &str, permission_id: i64) {
        let mut cache = self.cache.lock();
        cache.pop(&Self::cache_key(account, permission_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::models::PoolMembership;
    use std::path::PathBuf;

    async fn test_db() -> DbPool {
        let config = DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        };
        let pool = db::init_pool(&config).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_resolves_known_membership() {
        let pool = test_db().await;
        db::upsert_pool_membership(
            &pool,
            &PoolMembership {
                account: "TMember".to_string(),
                pool: "TPool".to_string(),
                permission_id: 3,
                permission_name: "active0".to_string(),
                discovered_at: Utc::now(),
                last_seen_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        let resolver = PoolResolver::new(pool, 16, 600);
        let resolved = resolver.get_pool_for_account("TMember", 3).await.unwrap();
        assert_eq!(resolved, Some("TPool".to_string()));
    }

    #[tokio::test]
    async fn test_absence_resolves_to_none() {
        let pool = test_db().await;
        let resolver = PoolResolver::new(pool, 16, 600);

        let resolved = resolver.get_pool_for_account("TUnknown", 5).await.unwrap();
        assert_eq!(resolved, None);

        // Second lookup is served from the negative cache entry
        let resolved = resolver.get_pool_for_account("TUnknown", 5).await.unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_lookup() {
        let pool = test_db().await;
        let resolver = PoolResolver::new(pool.clone(), 16, 600);

        // Prime the negative entry
        assert_eq!(
            resolver.get_pool_for_account("TLate", 4).await.unwrap(),
            None
        );

        db::upsert_pool_membership(
            &pool,
            &PoolMembership {
                account: "TLate".to_string(),
                pool: "TPool".to_string(),
                permission_id: 4,
                permission_name: "active1".to_string(),
                discovered_at: Utc::now(),
                last_seen_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        resolver.invalidate("TLate", 4);
        assert_eq!(
            resolver.get_pool_for_account("TLate", 4).await.unwrap(),
            Some("TPool".to_string())
        );
    }
}
