//! Transaction observer: the ingestion entry point
//!
//! Receives one parsed transaction at a time in block order, classifies
//! it, persists the canonical delegation record, and fans out to whale
//! detection and pool tracking. Safe to call twice with the same tx_id:
//! the canonical insert is idempotent and a duplicate is the expected
//! outcome of block reprocessing, not a failure.
//!
//! Error policy: only a failure to persist the canonical record
//! propagates to the caller (the block-processing loop must know whether
//! a block was fully absorbed). Whale detection and pool tracking are
//! fault-isolated; their failures are logged and swallowed.

use crate::abi;
use crate::db::{self, DbPool, InsertOutcome};
use crate::error::AppResult;
use crate::models::{
    ContractType, DelegationRecord, Transaction, FIRST_POOL_PERMISSION_ID,
};
use crate::pools::PoolDelegationTracker;
use crate::whale::WhaleDetector;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of processing one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Canonical record written
    Recorded,
    /// tx_id already ingested; downstream detection re-ran idempotently
    Duplicate,
    /// Not a delegation transaction; nothing persisted
    Ignored,
}

pub struct TransactionObserver {
    db: DbPool,
    whale: Arc<WhaleDetector>,
    tracker: Arc<PoolDelegationTracker>,
}

impl TransactionObserver {
    pub fn new(db: DbPool, whale: Arc<WhaleDetector>, tracker: Arc<PoolDelegationTracker>) -> Self {
        Self { db, whale, tracker }
    }

    /// Process one transaction from the block stream
    pub async fn process(&self, tx: &Transaction) -> AppResult<IngestOutcome> {
        if !tx.contract_type.is_delegation() {
            self.recognize_token_creation(tx);
            return Ok(IngestOutcome::Ignored);
        }

        let record = DelegationRecord {
            tx_id: tx.tx_id.clone(),
            timestamp: tx.timestamp,
            block_number: tx.block_number,
            from_address: tx.from_address.clone(),
            to_address: tx.to_address.clone(),
            resource_type: tx.resource_type(),
            amount_sun: tx.signed_amount_sun(),
            locked: tx.parameters.lock.unwrap_or(false) || tx.parameters.lock_period.is_some(),
            lock_period: tx.parameters.lock_period,
        };

        // Canonical persist: the only path whose failure propagates
        let outcome = match db::insert_delegation_if_absent(&self.db, &record).await? {
            InsertOutcome::Inserted => {
                tracing::debug!(
                    tx_id = %record.tx_id,
                    block = record.block_number,
                    amount_sun = record.amount_sun,
                    resource = %record.resource_type,
                    "Delegation recorded"
                );
                IngestOutcome::Recorded
            }
            InsertOutcome::AlreadyExists => {
                // Expected after observer restart or block reprocessing
                tracing::warn!(tx_id = %record.tx_id, "Duplicate delegation skipped");
                IngestOutcome::Duplicate
            }
        };

        // Derived paths are best-effort; both re-run safely on duplicates
        if let Err(e) = self.whale.detect(&record).await {
            tracing::warn!(error = %e, tx_id = %record.tx_id, "Whale detection failed, continuing");
        }

        if tx.contract_type == ContractType::DelegateResource
            && tx.permission_id >= FIRST_POOL_PERMISSION_ID
        {
            if let Err(e) = self
                .tracker
                .track(&record, tx.permission_id, tx.parameters.lock_period)
                .await
            {
                tracing::warn!(error = %e, tx_id = %record.tx_id, "Pool tracking failed, continuing");
            }
        }

        Ok(outcome)
    }

    /// Recognize token-creation calls to the factory contract. Purely
    /// informational; anything that doesn't match is silently ignored.
    fn recognize_token_creation(&self, tx: &Transaction) {
        if tx.contract_type != ContractType::TriggerSmartContract {
            return;
        }
        if tx.to_address != abi::TOKEN_FACTORY_CONTRACT {
            return;
        }
        let Some(data) = tx.parameters.data.as_deref() else {
            return;
        };

        if let Some(token) = abi::parse_token_creation(data) {
            tracing::info!(
                tx_id = %tx.tx_id,
                name = %token.name,
                symbol = %token.symbol,
                "Resource token created via factory"
            );
        }
    }
}
