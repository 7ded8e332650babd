//! Pool delegation tracker
//!
//! Persists pool-attributed delegations with their normalized economic
//! value, then triggers the throttled broadcaster. Invoked only for
//! delegations (never reclaims) authorized under a non-owner permission.
//! Pool attribution is resolved eagerly at ingestion and stored on the
//! row; a membership discovered later does not re-attribute old rows.

use crate::broadcast::ThrottledBroadcaster;
use crate::db::{self, DbPool, InsertOutcome};
use crate::error::AppResult;
use crate::models::{DelegationRecord, PoolDelegation};
use crate::pools::PoolResolver;
use std::sync::Arc;

pub struct PoolDelegationTracker {
    db: DbPool,
    resolver: Arc<PoolResolver>,
    broadcaster: Arc<ThrottledBroadcaster>,
    block_interval_secs: u64,
}

impl PoolDelegationTracker {
    pub fn new(
        db: DbPool,
        resolver: Arc<PoolResolver>,
        broadcaster: Arc<ThrottledBroadcaster>,
        block_interval_secs: u64,
    ) -> Self {
        Self {
            db,
            resolver,
            broadcaster,
            block_interval_secs,
        }
    }

    /// Persist one pool-attributed delegation and trigger a broadcast for
    /// its block. Duplicate tx_ids are a no-op.
    pub async fn track(
        &self,
        record: &DelegationRecord,
        permission_id: i64,
        lock_period: Option<i64>,
    ) -> AppResult<()> {
        let pool_address = self
            .resolver
            .get_pool_for_account(&record.from_address, permission_id)
            .await?;

        let rental_period_minutes = lock_period
            .map(|lp| PoolDelegation::rental_period_minutes(lp, self.block_interval_secs));
        let normalized_amount_trx =
            PoolDelegation::normalized_amount_trx(record.amount_sun, rental_period_minutes);

        let delegation = PoolDelegation {
            tx_id: record.tx_id.clone(),
            timestamp: record.timestamp,
            block_number: record.block_number,
            from_address: record.from_address.clone(),
            to_address: record.to_address.clone(),
            pool_address: pool_address.clone(),
            resource_type: record.resource_type,
            amount_sun: record.amount_sun,
            permission_id,
            lock_period,
            rental_period_minutes,
            normalized_amount_trx,
        };

        match db::insert_pool_delegation_if_absent(&self.db, &delegation).await? {
            InsertOutcome::AlreadyExists => {
                tracing::debug!(tx_id = %record.tx_id, "Pool delegation already tracked");
                return Ok(());
            }
            InsertOutcome::Inserted => {
                tracing::info!(
                    tx_id = %record.tx_id,
                    pool = ?pool_address,
                    permission_id = permission_id,
                    normalized_trx = normalized_amount_trx,
                    "Pool delegation tracked"
                );
            }
        }

        self.broadcaster.emit_pool_update(record.block_number);
        Ok(())
    }
}
