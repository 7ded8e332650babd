//! Background job integration tests
//!
//! Covers the summation aggregator (interval resume, empty-interval skip,
//! net-field consistency) and the purge job cutoffs against a real SQLite
//! database.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use tronwatch::config::DatabaseConfig;
use tronwatch::db;
use tronwatch::jobs;
use tronwatch::models::{DelegationRecord, ResourceType, SummationRecord};
use tronwatch::settings::{Settings, SettingsCache};

async fn create_test_db() -> (db::DbPool, Arc<SettingsCache>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: temp_dir.path().join("test.db"),
        max_connections: 5,
    };

    let pool = db::init_pool(&config).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let settings = Arc::new(SettingsCache::with_ttl(pool.clone(), Duration::hours(1)));
    (pool, settings, temp_dir)
}

fn record(tx_id: &str, block: i64, resource: ResourceType, amount_sun: i64) -> DelegationRecord {
    DelegationRecord {
        tx_id: tx_id.to_string(),
        timestamp: Utc::now(),
        block_number: block,
        from_address: "TFrom111111111111111111111111111111".to_string(),
        to_address: "TTo11111111111111111111111111111111".to_string(),
        resource_type: resource,
        amount_sun,
        locked: false,
        lock_period: None,
    }
}

#[tokio::test]
async fn test_summation_rolls_up_signed_records() {
    let (pool, settings, _dir) = create_test_db().await;

    db::insert_delegation_if_absent(&pool, &record("s1", 10, ResourceType::Energy, 5_000_000))
        .await
        .unwrap();
    db::insert_delegation_if_absent(&pool, &record("s2", 20, ResourceType::Energy, -2_000_000))
        .await
        .unwrap();
    db::insert_delegation_if_absent(&pool, &record("s3", 30, ResourceType::Bandwidth, 1_000_000))
        .await
        .unwrap();

    let written = jobs::summation::run_once(&pool, &settings)
        .await
        .unwrap()
        .expect("interval with records should write a summation");

    assert_eq!(written.end_block, 30);
    assert_eq!(written.energy_delegated, 5_000_000);
    assert_eq!(written.energy_reclaimed, 2_000_000);
    assert_eq!(written.net_energy, 3_000_000);
    assert_eq!(written.bandwidth_delegated, 1_000_000);
    assert_eq!(written.net_bandwidth, 1_000_000);
    assert_eq!(written.transaction_count, 3);
    assert_eq!(written.total_transactions_delegated, 2);
    assert_eq!(written.total_transactions_undelegated, 1);
    assert_eq!(written.total_transactions_net, 1);

    let persisted = db::get_last_summation(&pool).await.unwrap().unwrap();
    assert_eq!(persisted.end_block, written.end_block);
    assert_eq!(persisted.net_energy, written.net_energy);
}

#[tokio::test]
async fn test_summation_skips_when_no_records() {
    let (pool, settings, _dir) = create_test_db().await;

    let written = jobs::summation::run_once(&pool, &settings).await.unwrap();
    assert!(written.is_none());
    assert!(db::get_last_summation(&pool).await.unwrap().is_none());
}

#[tokio::test]
async fn test_summation_intervals_do_not_overlap() {
    let (pool, settings, _dir) = create_test_db().await;

    db::insert_delegation_if_absent(&pool, &record("o1", 50, ResourceType::Energy, 1_000_000))
        .await
        .unwrap();
    let first = jobs::summation::run_once(&pool, &settings)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.end_block, 50);

    // No new blocks yet: nothing to aggregate
    assert!(jobs::summation::run_once(&pool, &settings)
        .await
        .unwrap()
        .is_none());

    // A later block starts the next interval just past the previous end
    db::insert_delegation_if_absent(&pool, &record("o2", 60, ResourceType::Energy, 2_000_000))
        .await
        .unwrap();
    let second = jobs::summation::run_once(&pool, &settings)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(second.start_block, first.end_block + 1);
    assert_eq!(second.end_block, 60);
    assert_eq!(second.energy_delegated, 2_000_000);
    assert_eq!(second.transaction_count, 1);
}

#[tokio::test]
async fn test_summation_skips_empty_interval_without_advancing() {
    let (pool, settings, _dir) = create_test_db().await;

    db::insert_delegation_if_absent(&pool, &record("e1", 40, ResourceType::Bandwidth, 1_000_000))
        .await
        .unwrap();
    jobs::summation::run_once(&pool, &settings).await.unwrap();

    let before = db::get_summations_between(
        &pool,
        Utc::now() - Duration::hours(1),
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap()
    .len();

    // Re-running with no new data writes no empty bucket
    jobs::summation::run_once(&pool, &settings).await.unwrap();

    let after = db::get_summations_between(
        &pool,
        Utc::now() - Duration::hours(1),
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap()
    .len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_purge_deletes_by_retention_cutoffs() {
    let (pool, settings, _dir) = create_test_db().await;
    settings
        .update(Settings {
            details_retention_days: 30,
            summation_retention_months: 6,
            ..Settings::default()
        })
        .await
        .unwrap();

    let mut old_detail = record("p-old", 10, ResourceType::Energy, 1_000_000);
    old_detail.timestamp = Utc::now() - Duration::days(45);
    db::insert_delegation_if_absent(&pool, &old_detail).await.unwrap();

    let fresh_detail = record("p-new", 11, ResourceType::Energy, 1_000_000);
    db::insert_delegation_if_absent(&pool, &fresh_detail).await.unwrap();

    // ~7 months old vs fresh summary
    let old_summary = SummationRecord::from_totals(
        Utc::now() - Duration::days(210),
        1,
        10,
        1_000,
        0,
        0,
        0,
        1,
        0,
    );
    db::insert_summation(&pool, &old_summary).await.unwrap();
    let fresh_summary =
        SummationRecord::from_totals(Utc::now(), 11, 20, 2_000, 0, 0, 0, 1, 0);
    db::insert_summation(&pool, &fresh_summary).await.unwrap();

    let (details_deleted, summaries_deleted) =
        jobs::purge::run_once(&pool, &settings).await.unwrap();

    assert_eq!(details_deleted, 1);
    assert_eq!(summaries_deleted, 1);
    assert_eq!(db::count_delegations(&pool).await.unwrap(), 1);

    let remaining = db::get_summations_between(
        &pool,
        Utc::now() - Duration::days(365),
        Utc::now() + Duration::hours(1),
    )
    .await
    .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].start_block, 11);
}

#[tokio::test]
async fn test_purge_is_noop_within_retention() {
    let (pool, settings, _dir) = create_test_db().await;

    db::insert_delegation_if_absent(&pool, &record("p1", 5, ResourceType::Energy, 1_000_000))
        .await
        .unwrap();

    let (details_deleted, summaries_deleted) =
        jobs::purge::run_once(&pool, &settings).await.unwrap();
    assert_eq!(details_deleted, 0);
    assert_eq!(summaries_deleted, 0);
    assert_eq!(db::count_delegations(&pool).await.unwrap(), 1);
}
