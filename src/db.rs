//! Database module for tronwatch
//!
//! Manages the SQLite connection pool (WAL mode) and provides all
//! persistence operations for delegation, whale, pool, membership and
//! summation tables, plus the settings key-value store.
//!
//! Idempotent inserts go through `INSERT OR IGNORE` and report an explicit
//! [`InsertOutcome`], so callers branch on duplicates without sniffing
//! error strings.

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    DelegationRecord, PoolDelegation, PoolMembership, ResourceType, SummationRecord,
    WhaleDelegation,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

/// Type alias for the SQLite connection pool
pub type DbPool = Pool<Sqlite>;

/// Outcome of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row was written
    Inserted,
    /// A row with the same key already exists; nothing was written
    AlreadyExists,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS delegations (
    tx_id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    block_number INTEGER NOT NULL,
    from_address TEXT NOT NULL,
    to_address TEXT NOT NULL,
    resource_type INTEGER NOT NULL,
    amount_sun INTEGER NOT NULL,
    locked INTEGER NOT NULL DEFAULT 0,
    lock_period INTEGER
);
CREATE INDEX IF NOT EXISTS idx_delegations_timestamp ON delegations(timestamp);
CREATE INDEX IF NOT EXISTS idx_delegations_block ON delegations(block_number);

CREATE TABLE IF NOT EXISTS whale_delegations (
    tx_id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    from_address TEXT NOT NULL,
    to_address TEXT NOT NULL,
    resource_type INTEGER NOT NULL,
    amount_sun INTEGER NOT NULL,
    amount_trx REAL NOT NULL,
    block_number INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_whales_timestamp ON whale_delegations(timestamp);

CREATE TABLE IF NOT EXISTS pool_delegations (
    tx_id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    block_number INTEGER NOT NULL,
    from_address TEXT NOT NULL,
    to_address TEXT NOT NULL,
    pool_address TEXT,
    resource_type INTEGER NOT NULL,
    amount_sun INTEGER NOT NULL,
    permission_id INTEGER NOT NULL,
    lock_period INTEGER,
    rental_period_minutes INTEGER,
    normalized_amount_trx REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pool_delegations_timestamp ON pool_delegations(timestamp);
CREATE INDEX IF NOT EXISTS idx_pool_delegations_pool ON pool_delegations(pool_address);

CREATE TABLE IF NOT EXISTS pool_memberships (
    account TEXT NOT NULL,
    permission_id INTEGER NOT NULL,
    pool TEXT NOT NULL,
    permission_name TEXT NOT NULL DEFAULT '',
    discovered_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL,
    PRIMARY KEY (account, permission_id)
);

CREATE TABLE IF NOT EXISTS summations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    start_block INTEGER NOT NULL,
    end_block INTEGER NOT NULL,
    energy_delegated INTEGER NOT NULL,
    energy_reclaimed INTEGER NOT NULL,
    bandwidth_delegated INTEGER NOT NULL,
    bandwidth_reclaimed INTEGER NOT NULL,
    net_energy INTEGER NOT NULL,
    net_bandwidth INTEGER NOT NULL,
    transaction_count INTEGER NOT NULL,
    total_transactions_delegated INTEGER NOT NULL,
    total_transactions_undelegated INTEGER NOT NULL,
    total_transactions_net INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_summations_timestamp ON summations(timestamp);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    // Ensure data directory exists
    if let Some(parent) = config.path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(format!("Failed to create database directory: {}", e))
            })?;
            info!("Created database directory: {:?}", parent);
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", config.path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)
        .map_err(AppError::Database)?
        // Enable WAL mode for concurrent reads
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(connect_options)
        .await?;

    info!(
        "Database pool initialized: {:?} (max {} connections)",
        config.path, config.max_connections
    );

    Ok(pool)
}

/// Apply the schema. All statements are idempotent (IF NOT EXISTS), so
/// startup after an upgrade is safe.
pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    // SQLite doesn't support multiple statements in one query
    for statement in SCHEMA.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt).execute(pool).await?;
    }

    info!("Database schema applied successfully");
    Ok(())
}

// =============================================================================
// CANONICAL DELEGATIONS
// =============================================================================

/// Insert a canonical delegation record unless its tx_id already exists
pub async fn insert_delegation_if_absent(
    pool: &DbPool,
    record: &DelegationRecord,
) -> AppResult<InsertOutcome> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO delegations (
            tx_id, timestamp, block_number, from_address, to_address,
            resource_type, amount_sun, locked, lock_period
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.tx_id)
    .bind(record.timestamp)
    .bind(record.block_number)
    .bind(&record.from_address)
    .bind(&record.to_address)
    .bind(record.resource_type.code())
    .bind(record.amount_sun)
    .bind(if record.locked { 1 } else { 0 })
    .bind(record.lock_period)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::AlreadyExists)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Count all canonical delegation records
pub async fn count_delegations(pool: &DbPool) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM delegations")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

/// Highest block number seen among canonical records
pub async fn max_delegation_block(pool: &DbPool) -> AppResult<Option<i64>> {
    let row: (Option<i64>,) = sqlx::query_as("SELECT MAX(block_number) FROM delegations")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Per-direction totals over a block range, used by the summation aggregator
#[derive(Debug, Clone, Default)]
pub struct RangeTotals {
    pub energy_delegated: i64,
    pub energy_reclaimed: i64,
    pub bandwidth_delegated: i64,
    pub bandwidth_reclaimed: i64,
    pub transactions_delegated: i64,
    pub transactions_undelegated: i64,
}

impl RangeTotals {
    pub fn transaction_count(&self) -> i64 {
        self.transactions_delegated + self.transactions_undelegated
    }
}

/// Sum delegation amounts by resource type and sign over `(start_block, end_block]`
pub async fn sum_delegations_in_range(
    pool: &DbPool,
    start_block_exclusive: i64,
    end_block_inclusive: i64,
) -> AppResult<RangeTotals> {
    let row: (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN resource_type = 1 AND amount_sun > 0 THEN amount_sun ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN resource_type = 1 AND amount_sun < 0 THEN -amount_sun ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN resource_type = 0 AND amount_sun > 0 THEN amount_sun ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN resource_type = 0 AND amount_sun < 0 THEN -amount_sun ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN amount_sun > 0 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN amount_sun < 0 THEN 1 ELSE 0 END), 0)
        FROM delegations
        WHERE block_number > ? AND block_number <= ?
        "#,
    )
    .bind(start_block_exclusive)
    .bind(end_block_inclusive)
    .fetch_one(pool)
    .await?;

    Ok(RangeTotals {
        energy_delegated: row.0,
        energy_reclaimed: row.1,
        bandwidth_delegated: row.2,
        bandwidth_reclaimed: row.3,
        transactions_delegated: row.4,
        transactions_undelegated: row.5,
    })
}

/// Delete canonical records older than the cutoff. Safe to run concurrently
/// with ingestion: deletes by timestamp only.
pub async fn delete_delegations_before(
    pool: &DbPool,
    cutoff: DateTime<Utc>,
) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM delegations WHERE timestamp < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// WHALE DELEGATIONS
// =============================================================================

/// Insert a whale record unless its tx_id already exists
pub async fn insert_whale_if_absent(
    pool: &DbPool,
    whale: &WhaleDelegation,
) -> AppResult<InsertOutcome> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO whale_delegations (
            tx_id, timestamp, from_address, to_address, resource_type,
            amount_sun, amount_trx, block_number
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&whale.tx_id)
    .bind(whale.timestamp)
    .bind(&whale.from_address)
    .bind(&whale.to_address)
    .bind(whale.resource_type.code())
    .bind(whale.amount_sun)
    .bind(whale.amount_trx)
    .bind(whale.block_number)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::AlreadyExists)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Recent whale delegations, most recent first, optionally filtered by resource
pub async fn recent_whales(
    pool: &DbPool,
    limit: i64,
    resource_type: Option<ResourceType>,
) -> AppResult<Vec<WhaleDelegation>> {
    type WhaleRow = (String, DateTime<Utc>, String, String, i64, i64, f64, i64);

    let rows: Vec<WhaleRow> = match resource_type {
        Some(rt) => {
            sqlx::query_as(
                r#"
                SELECT tx_id, timestamp, from_address, to_address, resource_type,
                       amount_sun, amount_trx, block_number
                FROM whale_delegations
                WHERE resource_type = ?
                ORDER BY timestamp DESC
                LIMIT ?
                "#,
            )
            .bind(rt.code())
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT tx_id, timestamp, from_address, to_address, resource_type,
                       amount_sun, amount_trx, block_number
                FROM whale_delegations
                ORDER BY timestamp DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(
            |(tx_id, timestamp, from_address, to_address, rt, amount_sun, amount_trx, block)| {
                WhaleDelegation {
                    tx_id,
                    timestamp,
                    from_address,
                    to_address,
                    resource_type: ResourceType::from_code(rt)
                        .unwrap_or(ResourceType::Bandwidth),
                    amount_sun,
                    amount_trx,
                    block_number: block,
                }
            },
        )
        .collect())
}

/// Count whale records (used by tests and the health surface)
pub async fn count_whales(pool: &DbPool) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM whale_delegations")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

// =============================================================================
// POOL DELEGATIONS
// =============================================================================

/// Insert a pool delegation unless its tx_id already exists
pub async fn insert_pool_delegation_if_absent(
    pool: &DbPool,
    delegation: &PoolDelegation,
) -> AppResult<InsertOutcome> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO pool_delegations (
            tx_id, timestamp, block_number, from_address, to_address,
            pool_address, resource_type, amount_sun, permission_id,
            lock_period, rental_period_minutes, normalized_amount_trx
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&delegation.tx_id)
    .bind(delegation.timestamp)
    .bind(delegation.block_number)
    .bind(&delegation.from_address)
    .bind(&delegation.to_address)
    .bind(&delegation.pool_address)
    .bind(delegation.resource_type.code())
    .bind(delegation.amount_sun)
    .bind(delegation.permission_id)
    .bind(delegation.lock_period)
    .bind(delegation.rental_period_minutes)
    .bind(delegation.normalized_amount_trx)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        Ok(InsertOutcome::AlreadyExists)
    } else {
        Ok(InsertOutcome::Inserted)
    }
}

/// Aggregate pool volume over a trailing window, grouped by pool address.
/// Rows with an unresolved pool are grouped under NULL.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolVolume {
    pub pool_address: Option<String>,
    pub delegation_count: i64,
    pub total_amount_sun: i64,
    pub total_normalized_trx: f64,
}

pub async fn pool_volumes_since(
    pool: &DbPool,
    cutoff: DateTime<Utc>,
) -> AppResult<Vec<PoolVolume>> {
    let rows: Vec<(Option<String>, i64, i64, f64)> = sqlx::query_as(
        r#"
        SELECT pool_address, COUNT(*), COALESCE(SUM(amount_sun), 0),
               COALESCE(SUM(normalized_amount_trx), 0.0)
        FROM pool_delegations
        WHERE timestamp >= ?
        GROUP BY pool_address
        ORDER BY SUM(normalized_amount_trx) DESC
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(pool_address, delegation_count, total_amount_sun, total_normalized_trx)| {
            PoolVolume {
                pool_address,
                delegation_count,
                total_amount_sun,
                total_normalized_trx,
            }
        })
        .collect())
}

/// Per-member volume within one pool over a trailing window
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolMemberVolume {
    pub account: String,
    pub delegation_count: i64,
    pub total_normalized_trx: f64,
}

pub async fn pool_member_volumes_since(
    pool: &DbPool,
    pool_address: &str,
    cutoff: DateTime<Utc>,
) -> AppResult<Vec<PoolMemberVolume>> {
    let rows: Vec<(String, i64, f64)> = sqlx::query_as(
        r#"
        SELECT from_address, COUNT(*), COALESCE(SUM(normalized_amount_trx), 0.0)
        FROM pool_delegations
        WHERE pool_address = ? AND timestamp >= ?
        GROUP BY from_address
        ORDER BY SUM(normalized_amount_trx) DESC
        "#,
    )
    .bind(pool_address)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(account, delegation_count, total_normalized_trx)| PoolMemberVolume {
            account,
            delegation_count,
            total_normalized_trx,
        })
        .collect())
}

/// (account, permission_id) pairs seen in pool delegations that have no
/// resolved pool yet. Discovery candidates.
pub async fn unresolved_pool_accounts(
    pool: &DbPool,
    limit: i64,
) -> AppResult<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT DISTINCT from_address, permission_id
        FROM pool_delegations
        WHERE pool_address IS NULL
        ORDER BY timestamp DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Count pool delegation records
pub async fn count_pool_delegations(pool: &DbPool) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pool_delegations")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

// =============================================================================
// POOL MEMBERSHIPS
// =============================================================================

/// Look up the membership row for (account, permission_id)
pub async fn get_pool_membership(
    pool: &DbPool,
    account: &str,
    permission_id: i64,
) -> AppResult<Option<PoolMembership>> {
    let row: Option<(String, i64, String, String, DateTime<Utc>, DateTime<Utc>)> =
        sqlx::query_as(
            r#"
            SELECT account, permission_id, pool, permission_name, discovered_at, last_seen_at
            FROM pool_memberships
            WHERE account = ? AND permission_id = ?
            "#,
        )
        .bind(account)
        .bind(permission_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(
        |(account, permission_id, pool, permission_name, discovered_at, last_seen_at)| {
            PoolMembership {
                account,
                permission_id,
                pool,
                permission_name,
                discovered_at,
                last_seen_at,
            }
        },
    ))
}

/// Insert or refresh a membership mapping
pub async fn upsert_pool_membership(
    pool: &DbPool,
    membership: &PoolMembership,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pool_memberships (
            account, permission_id, pool, permission_name, discovered_at, last_seen_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(account, permission_id) DO UPDATE SET
            pool = excluded.pool,
            permission_name = excluded.permission_name,
            last_seen_at = excluded.last_seen_at
        "#,
    )
    .bind(&membership.account)
    .bind(membership.permission_id)
    .bind(&membership.pool)
    .bind(&membership.permission_name)
    .bind(membership.discovered_at)
    .bind(membership.last_seen_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Refresh last_seen_at on a read hit
pub async fn touch_pool_membership(
    pool: &DbPool,
    account: &str,
    permission_id: i64,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE pool_memberships SET last_seen_at = ? WHERE account = ? AND permission_id = ?",
    )
    .bind(Utc::now())
    .bind(account)
    .bind(permission_id)
    .execute(pool)
    .await?;

    Ok(())
}

// =============================================================================
// SUMMATIONS
// =============================================================================

/// Insert a summation record
pub async fn insert_summation(pool: &DbPool, record: &SummationRecord) -> AppResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO summations (
            timestamp, start_block, end_block,
            energy_delegated, energy_reclaimed,
            bandwidth_delegated, bandwidth_reclaimed,
            net_energy, net_bandwidth,
            transaction_count, total_transactions_delegated,
            total_transactions_undelegated, total_transactions_net
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.timestamp)
    .bind(record.start_block)
    .bind(record.end_block)
    .bind(record.energy_delegated)
    .bind(record.energy_reclaimed)
    .bind(record.bandwidth_delegated)
    .bind(record.bandwidth_reclaimed)
    .bind(record.net_energy)
    .bind(record.net_bandwidth)
    .bind(record.transaction_count)
    .bind(record.total_transactions_delegated)
    .bind(record.total_transactions_undelegated)
    .bind(record.total_transactions_net)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

type SummationRow = (
    DateTime<Utc>,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
    i64,
);

fn summation_from_row(row: SummationRow) -> SummationRecord {
    SummationRecord {
        timestamp: row.0,
        start_block: row.1,
        end_block: row.2,
        energy_delegated: row.3,
        energy_reclaimed: row.4,
        bandwidth_delegated: row.5,
        bandwidth_reclaimed: row.6,
        net_energy: row.7,
        net_bandwidth: row.8,
        transaction_count: row.9,
        total_transactions_delegated: row.10,
        total_transactions_undelegated: row.11,
        total_transactions_net: row.12,
    }
}

const SUMMATION_COLUMNS: &str = r#"
    timestamp, start_block, end_block,
    energy_delegated, energy_reclaimed,
    bandwidth_delegated, bandwidth_reclaimed,
    net_energy, net_bandwidth,
    transaction_count, total_transactions_delegated,
    total_transactions_undelegated, total_transactions_net
"#;

/// Most recently written summation record (highest end_block)
pub async fn get_last_summation(pool: &DbPool) -> AppResult<Option<SummationRecord>> {
    let row: Option<SummationRow> = sqlx::query_as(&format!(
        "SELECT {SUMMATION_COLUMNS} FROM summations ORDER BY end_block DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(summation_from_row))
}

/// Summation records within a time window, oldest first
pub async fn get_summations_between(
    pool: &DbPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Vec<SummationRecord>> {
    let rows: Vec<SummationRow> = sqlx::query_as(&format!(
        r#"
        SELECT {SUMMATION_COLUMNS} FROM summations
        WHERE timestamp >= ? AND timestamp <= ?
        ORDER BY timestamp ASC
        "#
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(summation_from_row).collect())
}

/// Delete summation records older than the cutoff
pub async fn delete_summations_before(
    pool: &DbPool,
    cutoff: DateTime<Utc>,
) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM summations WHERE timestamp < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// SETTINGS KEY-VALUE STORE
// =============================================================================

/// Read one settings value
pub async fn get_setting(pool: &DbPool, key: &str) -> AppResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v))
}

/// Write one settings value
pub async fn set_setting(pool: &DbPool, key: &str, value: &str) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_pool_creation() {
        let config = DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        };

        let pool = init_pool(&config).await;
        assert!(pool.is_ok());
    }
}
