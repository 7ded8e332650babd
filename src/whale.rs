//! Whale detector
//!
//! Threshold check plus idempotent persistence of qualifying delegations.
//! Reclaims and delegations are treated identically once their magnitude
//! clears the configured bar (inclusive boundary). Best-effort: the
//! observer swallows failures so whale detection can never block ingestion.

use crate::db::{self, DbPool, InsertOutcome};
use crate::error::AppResult;
use crate::models::{DelegationRecord, WhaleDelegation};
use crate::settings::SettingsCache;
use std::sync::Arc;

pub struct WhaleDetector {
    db: DbPool,
    settings: Arc<SettingsCache>,
}

impl WhaleDetector {
    pub fn new(db: DbPool, settings: Arc<SettingsCache>) -> Self {
        Self { db, settings }
    }

    /// Persist a whale record if the delegation's magnitude clears the
    /// configured threshold. No-op when detection is disabled or below
    /// threshold; duplicate tx_ids are a no-op.
    pub async fn detect(&self, record: &DelegationRecord) -> AppResult<()> {
        let settings = self.settings.get().await?;

        if !settings.whale_detection_enabled {
            return Ok(());
        }
        if record.amount_sun.abs() < settings.whale_threshold_sun() {
            return Ok(());
        }

        let whale = WhaleDelegation::from_record(record);
        match db::insert_whale_if_absent(&self.db, &whale).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    tx_id = %whale.tx_id,
                    amount_trx = whale.amount_trx,
                    resource = %whale.resource_type,
                    "Whale delegation detected"
                );
            }
            InsertOutcome::AlreadyExists => {
                tracing::debug!(tx_id = %whale.tx_id, "Whale already recorded");
            }
        }

        Ok(())
    }
}
