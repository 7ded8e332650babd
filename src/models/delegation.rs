//! Stored records: canonical delegations and their derived rows

use super::{ResourceType, SUN_PER_TRX};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical record of one delegate/reclaim transaction.
///
/// `amount_sun` is signed: positive for a delegation, negative for a
/// reclaim. `tx_id` is the unique key; re-ingesting the same id is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub from_address: String,
    pub to_address: String,
    pub resource_type: ResourceType,
    pub amount_sun: i64,
    pub locked: bool,
    pub lock_period: Option<i64>,
}

/// Derived record for a delegation whose magnitude cleared the whale
/// threshold. Stored amount is always positive: reclaims and delegations
/// are treated identically once they clear the bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleDelegation {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub from_address: String,
    pub to_address: String,
    pub resource_type: ResourceType,
    pub amount_sun: i64,
    pub amount_trx: f64,
    pub block_number: i64,
}

impl WhaleDelegation {
    pub fn from_record(record: &DelegationRecord) -> Self {
        let amount_sun = record.amount_sun.abs();
        Self {
            tx_id: record.tx_id.clone(),
            timestamp: record.timestamp,
            from_address: record.from_address.clone(),
            to_address: record.to_address.clone(),
            resource_type: record.resource_type,
            amount_sun,
            amount_trx: amount_sun as f64 / SUN_PER_TRX as f64,
            block_number: record.block_number,
        }
    }
}

/// Derived record for a delegation authorized under a non-owner permission.
///
/// `pool_address` is nullable: membership discovery is eventually
/// consistent, and an unresolved pool at ingestion time is a normal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDelegation {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub block_number: i64,
    pub from_address: String,
    pub to_address: String,
    pub pool_address: Option<String>,
    pub resource_type: ResourceType,
    pub amount_sun: i64,
    pub permission_id: i64,
    pub lock_period: Option<i64>,
    pub rental_period_minutes: Option<i64>,
    pub normalized_amount_trx: f64,
}

impl PoolDelegation {
    /// Rental period in minutes for a locked delegation
    pub fn rental_period_minutes(lock_period: i64, block_interval_secs: u64) -> i64 {
        lock_period * block_interval_secs as i64 / 60
    }

    /// Normalized economic value: TRX amount scaled by the rental duration
    /// in days, with untimed delegations counted as one day.
    pub fn normalized_amount_trx(amount_sun: i64, rental_period_minutes: Option<i64>) -> f64 {
        let amount_trx = amount_sun.abs() as f64 / SUN_PER_TRX as f64;
        let rental_days = rental_period_minutes
            .map(|m| m as f64 / 60.0 / 24.0)
            .unwrap_or(0.0);
        amount_trx * rental_days.max(1.0)
    }
}

/// Mapping of a controlled account + permission id to its pool.
///
/// Written by the discovery loop, read by the resolver. Absence of a row
/// is a valid state (the account is not pool-controlled).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMembership {
    pub account: String,
    pub pool: String,
    pub permission_id: i64,
    pub permission_name: String,
    pub discovered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// One aggregation interval rolled up from canonical records.
///
/// Amounts are unsigned SUN totals per resource and direction; the net
/// fields always satisfy `net = delegated - reclaimed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummationRecord {
    pub timestamp: DateTime<Utc>,
    pub start_block: i64,
    pub end_block: i64,
    pub energy_delegated: i64,
    pub energy_reclaimed: i64,
    pub bandwidth_delegated: i64,
    pub bandwidth_reclaimed: i64,
    pub net_energy: i64,
    pub net_bandwidth: i64,
    pub transaction_count: i64,
    pub total_transactions_delegated: i64,
    pub total_transactions_undelegated: i64,
    pub total_transactions_net: i64,
}

impl SummationRecord {
    /// Build a record from per-direction totals, deriving the net fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_totals(
        timestamp: DateTime<Utc>,
        start_block: i64,
        end_block: i64,
        energy_delegated: i64,
        energy_reclaimed: i64,
        bandwidth_delegated: i64,
        bandwidth_reclaimed: i64,
        transactions_delegated: i64,
        transactions_undelegated: i64,
    ) -> Self {
        Self {
            timestamp,
            start_block,
            end_block,
            energy_delegated,
            energy_reclaimed,
            bandwidth_delegated,
            bandwidth_reclaimed,
            net_energy: energy_delegated - energy_reclaimed,
            net_bandwidth: bandwidth_delegated - bandwidth_reclaimed,
            transaction_count: transactions_delegated + transactions_undelegated,
            total_transactions_delegated: transactions_delegated,
            total_transactions_undelegated: transactions_undelegated,
            total_transactions_net: transactions_delegated - transactions_undelegated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractParameters, ContractType, Transaction};

    #[test]
    fn test_whale_stores_absolute_amount() {
        let record = DelegationRecord {
            tx_id: "t1".to_string(),
            timestamp: Utc::now(),
            block_number: 10,
            from_address: "TFrom".to_string(),
            to_address: "TTo".to_string(),
            resource_type: ResourceType::Energy,
            amount_sun: -3_000_000_000_000,
            locked: false,
            lock_period: None,
        };

        let whale = WhaleDelegation::from_record(&record);
        assert_eq!(whale.amount_sun, 3_000_000_000_000);
        assert_eq!(whale.amount_trx, 3_000_000.0);
    }

    #[test]
    fn test_rental_period_from_lock() {
        // 28800 blocks at 3s/block = 1 day
        assert_eq!(PoolDelegation::rental_period_minutes(28_800, 3), 1_440);
    }

    #[test]
    fn test_normalized_amount_untimed_counts_one_day() {
        // 100 TRX, no lock: rental days default to 1
        let normalized = PoolDelegation::normalized_amount_trx(100 * SUN_PER_TRX, None);
        assert_eq!(normalized, 100.0);
    }

    #[test]
    fn test_normalized_amount_scales_with_rental_days() {
        // 100 TRX for 3 days
        let normalized =
            PoolDelegation::normalized_amount_trx(100 * SUN_PER_TRX, Some(3 * 1_440));
        assert_eq!(normalized, 300.0);
    }

    #[test]
    fn test_normalized_amount_sub_day_lock_floors_at_one_day() {
        // 100 TRX locked for 6 hours still counts as one day
        let normalized = PoolDelegation::normalized_amount_trx(100 * SUN_PER_TRX, Some(360));
        assert_eq!(normalized, 100.0);
    }

    #[test]
    fn test_summation_net_consistency() {
        let record = SummationRecord::from_totals(
            Utc::now(),
            100,
            200,
            5_000,
            2_000,
            900,
            1_100,
            7,
            3,
        );

        assert_eq!(record.net_energy, record.energy_delegated - record.energy_reclaimed);
        assert_eq!(
            record.net_bandwidth,
            record.bandwidth_delegated - record.bandwidth_reclaimed
        );
        assert_eq!(record.transaction_count, 10);
        assert_eq!(record.total_transactions_net, 4);
    }

    #[test]
    fn test_transaction_to_record_sign() {
        let tx = Transaction {
            tx_id: "t2".to_string(),
            timestamp: Utc::now(),
            block_number: 5,
            from_address: "TFrom".to_string(),
            to_address: "TTo".to_string(),
            contract_type: ContractType::UndelegateResource,
            amount_sun: 42,
            permission_id: 0,
            parameters: ContractParameters::default(),
        };
        assert!(tx.signed_amount_sun() < 0);
    }
}
