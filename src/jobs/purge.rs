//! Purge job
//!
//! Enforces retention by deleting expired detail and summary records.
//! Deletes by timestamp cutoff only, so it needs no coordination with
//! concurrent ingestion. The cadence comes from runtime settings and is
//! re-read every cycle, so an operator change takes effect on the next
//! tick. Failures are logged and do not halt subsequent ticks.

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::settings::SettingsCache;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the purge job until cancelled
pub async fn run_purge_job(db: DbPool, settings: Arc<SettingsCache>, cancel_token: CancellationToken) {
    tracing::info!("Starting purge job");

    loop {
        let frequency_hours = match settings.get().await {
            Ok(s) => s.purge_frequency_hours.max(1),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read settings, purge deferred one hour");
                1
            }
        };

        let sleep = std::time::Duration::from_secs(frequency_hours as u64 * 3600);
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Purge job shutting down");
                break;
            }
            _ = tokio::time::sleep(sleep) => {
                match run_once(&db, &settings).await {
                    Ok((details, summaries)) => {
                        tracing::info!(
                            details_deleted = details,
                            summaries_deleted = summaries,
                            "Purge run complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Purge run failed, retrying next tick");
                    }
                }
            }
        }
    }
}

/// One purge pass. Returns (detail rows deleted, summary rows deleted).
pub async fn run_once(db: &DbPool, settings: &SettingsCache) -> AppResult<(u64, u64)> {
    let settings = settings.get().await?;
    let now = Utc::now();

    let details_cutoff = now - Duration::days(settings.details_retention_days);
    let details_deleted = db::delete_delegations_before(db, details_cutoff).await?;

    // Months approximated as 30-day spans for the cutoff
    let summation_cutoff = now - Duration::days(settings.summation_retention_months * 30);
    let summaries_deleted = db::delete_summations_before(db, summation_cutoff).await?;

    Ok((details_deleted, summaries_deleted))
}
