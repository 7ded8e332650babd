//! Throttled pool-update broadcaster
//!
//! The ingestion path must never wait for broadcast aggregation: block
//! production is metronomic and a slow aggregate query cannot be allowed
//! to stall block-by-block processing. `emit_pool_update` is therefore
//! fire-and-forget: it advances an atomic last-broadcast-block marker (at
//! most one broadcast per block), spawns the read-aggregate-and-publish
//! work, and tracks completion only through an in-flight gauge. The gauge
//! reaching [`BACKLOG_THRESHOLD`] is the signal that aggregation cannot
//! keep pace with block production.

use crate::db::{self, DbPool};
use crate::handlers::ws::{PoolsUpdateData, WsEvent, WsState};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

/// In-flight broadcasts at which backlog is reported
pub const BACKLOG_THRESHOLD: usize = 10;

/// Trailing window aggregated into each pool update
const AGGREGATE_WINDOW_HOURS: i64 = 24;

pub struct ThrottledBroadcaster {
    db: DbPool,
    ws: Arc<WsState>,
    /// Highest block for which a broadcast has been triggered
    last_broadcast_block: AtomicI64,
    /// Spawned-but-unfinished broadcast operations
    in_flight: AtomicUsize,
}

impl ThrottledBroadcaster {
    pub fn new(db: DbPool, ws: Arc<WsState>) -> Self {
        Self {
            db,
            ws,
            last_broadcast_block: AtomicI64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Trigger a pool-update broadcast for `block_number`, unless one has
    /// already been triggered for this block or a later one. Returns
    /// whether a broadcast was started. Never blocks on the aggregation.
    pub fn emit_pool_update(self: &Arc<Self>, block_number: i64) -> bool {
        if !self.advance_marker(block_number) {
            return false;
        }

        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        if pending >= BACKLOG_THRESHOLD {
            tracing::error!(
                pending = pending,
                block_number = block_number,
                "Pool broadcast backlog: aggregation cannot keep pace with block production"
            );
        }

        let broadcaster = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = broadcaster.aggregate_and_publish(block_number).await {
                tracing::warn!(error = %e, block_number = block_number, "Pool broadcast failed");
            }
            broadcaster.in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        true
    }

    /// Advance the marker iff `block_number` is strictly greater than the
    /// last broadcast block.
    fn advance_marker(&self, block_number: i64) -> bool {
        let previous = self
            .last_broadcast_block
            .fetch_max(block_number, Ordering::SeqCst);
        previous < block_number
    }

    /// Number of spawned-but-unfinished broadcasts
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Last block for which a broadcast was triggered
    pub fn last_broadcast_block(&self) -> i64 {
        self.last_broadcast_block.load(Ordering::SeqCst)
    }

    async fn aggregate_and_publish(&self, block_number: i64) -> crate::error::AppResult<()> {
        let cutoff = Utc::now() - Duration::hours(AGGREGATE_WINDOW_HOURS);
        let pools = db::pool_volumes_since(&self.db, cutoff).await?;

        self.ws.broadcast(WsEvent::PoolsUpdate(PoolsUpdateData {
            block_number,
            pools,
        }));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use std::path::PathBuf;

    async fn test_broadcaster() -> Arc<ThrottledBroadcaster> {
        let config = DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        };
        let pool = db::init_pool(&config).await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        Arc::new(ThrottledBroadcaster::new(pool, Arc::new(WsState::new())))
    }

    #[tokio::test]
    async fn test_marker_advances_only_on_strictly_greater_block() {
        let broadcaster = test_broadcaster().await;

        assert!(broadcaster.advance_marker(100));
        assert_eq!(broadcaster.last_broadcast_block(), 100);

        // Same block: no-op, marker unchanged
        assert!(!broadcaster.advance_marker(100));
        assert_eq!(broadcaster.last_broadcast_block(), 100);

        // Older block: no-op
        assert!(!broadcaster.advance_marker(99));
        assert_eq!(broadcaster.last_broadcast_block(), 100);

        // Next block fires again
        assert!(broadcaster.advance_marker(101));
        assert_eq!(broadcaster.last_broadcast_block(), 101);
    }

    #[tokio::test]
    async fn test_emit_is_throttled_per_block() {
        let broadcaster = test_broadcaster().await;

        assert!(broadcaster.emit_pool_update(100));
        assert!(!broadcaster.emit_pool_update(100));
        assert!(broadcaster.emit_pool_update(101));

        // Let spawned tasks drain so the gauge returns to zero
        for _ in 0..50 {
            if broadcaster.in_flight() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(broadcaster.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_pool_update() {
        let broadcaster = test_broadcaster().await;
        let mut rx = broadcaster.ws.tx.subscribe();

        assert!(broadcaster.emit_pool_update(42));

        let event = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .expect("broadcast timed out")
            .unwrap();

        match event {
            WsEvent::PoolsUpdate(data) => assert_eq!(data.block_number, 42),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
