//! Summation aggregator
//!
//! Rolls raw delegation records into one durable SummationRecord per run,
//! covering the block range since the last persisted record. Runs with no
//! empty buckets: an interval with zero qualifying transactions writes
//! nothing. Failures are logged and the job retries on the next tick.

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::handlers::ws::{SummaryUpdateData, WsEvent, WsState};
use crate::models::SummationRecord;
use crate::settings::SettingsCache;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run the summation aggregator until cancelled
pub async fn run_summation_job(
    db: DbPool,
    ws: Arc<WsState>,
    settings: Arc<SettingsCache>,
    interval_secs: u64,
    cancel_token: CancellationToken,
) {
    tracing::info!(interval_secs = interval_secs, "Starting summation aggregator");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Summation aggregator shutting down");
                break;
            }
            _ = interval.tick() => {
                match run_once(&db, &settings).await {
                    Ok(Some(record)) => {
                        tracing::info!(
                            start_block = record.start_block,
                            end_block = record.end_block,
                            transactions = record.transaction_count,
                            "Summation interval written"
                        );
                        ws.broadcast(WsEvent::SummaryUpdate(SummaryUpdateData {
                            timestamp: record.timestamp,
                            end_block: record.end_block,
                            transaction_count: record.transaction_count,
                        }));
                    }
                    Ok(None) => {
                        tracing::debug!("No qualifying transactions, summation skipped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Summation run failed, retrying next tick");
                    }
                }
            }
        }
    }
}

/// One aggregation pass. Returns the written record, or None when the
/// interval was empty (or there are no blocks to aggregate yet).
pub async fn run_once(
    db: &DbPool,
    settings: &SettingsCache,
) -> AppResult<Option<SummationRecord>> {
    let settings = settings.get().await?;

    let Some(end_block) = db::max_delegation_block(db).await? else {
        return Ok(None);
    };

    // Resume from the last persisted record; the first run covers one
    // interval's worth of trailing blocks.
    let start_block_exclusive = match db::get_last_summation(db).await? {
        Some(last) => last.end_block,
        None => (end_block - settings.blocks_per_interval).max(0),
    };

    if end_block <= start_block_exclusive {
        return Ok(None);
    }

    let totals = db::sum_delegations_in_range(db, start_block_exclusive, end_block).await?;
    if totals.transaction_count() == 0 {
        return Ok(None);
    }

    let record = SummationRecord::from_totals(
        Utc::now(),
        start_block_exclusive + 1,
        end_block,
        totals.energy_delegated,
        totals.energy_reclaimed,
        totals.bandwidth_delegated,
        totals.bandwidth_reclaimed,
        totals.transactions_delegated,
        totals.transactions_undelegated,
    );

    db::insert_summation(db, &record).await?;
    Ok(Some(record))
}
