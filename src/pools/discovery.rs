//! Pool membership discovery loop
//!
//! Background task that resolves (account, permission id) pairs to their
//! controlling pool by reading account permissions from a full node. Runs
//! on its own cadence with start/stop lifecycle; the resolver only ever
//! reads what this loop writes. Candidates are accounts whose pool
//! delegations are still unattributed.

use crate::db::{self, DbPool};
use crate::models::PoolMembership;
use crate::pools::PoolResolver;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Candidates examined per discovery cycle
const DISCOVERY_BATCH_SIZE: i64 = 50;

/// One active permission slot on an account
#[derive(Debug, Clone)]
pub struct AccountPermission {
    pub permission_id: i64,
    pub permission_name: String,
    /// Addresses holding keys on this permission; the first key is the
    /// controlling (pool) address
    pub key_addresses: Vec<String>,
}

/// Source of account permission data (a full-node HTTP API in production,
/// a fixture in tests)
#[async_trait]
pub trait MembershipSource: Send + Sync {
    async fn account_permissions(&self, account: &str) -> anyhow::Result<Vec<AccountPermission>>;
}

/// Membership source backed by a TRON full-node HTTP endpoint
pub struct HttpMembershipSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMembershipSource {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetAccountResponse {
    #[serde(default)]
    active_permission: Vec<ActivePermission>,
}

#[derive(Debug, Deserialize)]
struct ActivePermission {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    permission_name: String,
    #[serde(default)]
    keys: Vec<PermissionKey>,
}

#[derive(Debug, Deserialize)]
struct PermissionKey {
    address: String,
}

#[async_trait]
impl MembershipSource for HttpMembershipSource {
    async fn account_permissions(&self, account: &str) -> anyhow::Result<Vec<AccountPermission>> {
        let url = format!("{}/wallet/getaccount", self.endpoint);
        let response: GetAccountResponse = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "address": account, "visible": true }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .active_permission
            .into_iter()
            .map(|p| AccountPermission {
                permission_id: p.id,
                permission_name: p.permission_name,
                key_addresses: p.keys.into_iter().map(|k| k.address).collect(),
            })
            .collect())
    }
}

/// Run the discovery loop until cancelled
pub async fn run_discovery_loop(
    db: DbPool,
    resolver: Arc<PoolResolver>,
    source: Arc<dyn MembershipSource>,
    poll_interval_secs: u64,
    cancel_token: CancellationToken,
) {
    tracing::info!(
        poll_interval_secs = poll_interval_secs,
        "Starting pool membership discovery loop"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(poll_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Discovery loop shutting down");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = discovery_cycle(&db, &resolver, source.as_ref()).await {
                    tracing::warn!(error = %e, "Discovery cycle failed, retrying next tick");
                }
            }
        }
    }
}

async fn discovery_cycle(
    db: &DbPool,
    resolver: &PoolResolver,
    source: &dyn MembershipSource,
) -> anyhow::Result<()> {
    let candidates = db::unresolved_pool_accounts(db, DISCOVERY_BATCH_SIZE).await?;
    if candidates.is_empty() {
        tracing::debug!("No unresolved pool accounts");
        return Ok(());
    }

    tracing::debug!(candidates = candidates.len(), "Running discovery cycle");

    let mut discovered = 0usize;
    for (account, permission_id) in candidates {
        let permissions = match source.account_permissions(&account).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, account = %account, "Failed to fetch account permissions");
                continue;
            }
        };

        let Some(permission) = permissions
            .iter()
            .find(|p| p.permission_id == permission_id)
        else {
            continue;
        };

        let Some(pool_address) = permission.key_addresses.first() else {
            continue;
        };

        let now = Utc::now();
        db::upsert_pool_membership(
            db,
            &PoolMembership {
                account: account.clone(),
                pool: pool_address.clone(),
                permission_id,
                permission_name: permission.permission_name.clone(),
                discovered_at: now,
                last_seen_at: now,
            },
        )
        .await?;

        resolver.invalidate(&account, permission_id);
        discovered += 1;

        tracing::info!(
            account = %account,
            pool = %pool_address,
            permission_id = permission_id,
            "Discovered pool membership"
        );
    }

    if discovered > 0 {
        tracing::info!(discovered = discovered, "Discovery cycle complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::models::{PoolDelegation, ResourceType};
    use std::path::PathBuf;

    struct FixtureSource;

    #[async_trait]
    impl MembershipSource for FixtureSource {
        async fn account_permissions(
            &self,
            account: &str,
        ) -> anyhow::Result<Vec<AccountPermission>> {
            if account == "TMember" {
                Ok(vec![AccountPermission {
                    permission_id: 3,
                    permission_name: "active0".to_string(),
                    key_addresses: vec!["TPool".to_string()],
                }])
            } else {
                Ok(vec![])
            }
        }
    }

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
    async fn test_discovery_resolves_unattributed_accounts() {
        let pool = test_db().await;

        // An unattributed pool delegation from TMember under permission 3
        db::insert_pool_delegation_if_absent(
            &pool,
            &PoolDelegation {
                tx_id: "tx1".to_string(),
                timestamp: Utc::now(),
                block_number: 1,
                from_address: "TMember".to_string(),
                to_address: "TRenter".to_string(),
                pool_address: None,
                resource_type: ResourceType::Energy,
                amount_sun: 1_000_000,
                permission_id: 3,
                lock_period: None,
                rental_period_minutes: None,
                normalized_amount_trx: 1.0,
            },
        )
        .await
        .unwrap();

        let resolver = Arc::new(PoolResolver::new(pool.clone(), 16, 600));
        discovery_cycle(&pool, &resolver, &FixtureSource).await.unwrap();

        let membership = db::get_pool_membership(&pool, "TMember", 3)
            .await
            .unwrap()
            .expect("membership discovered");
        assert_eq!(membership.pool, "TPool");

        // The resolver now sees the discovered pool
        assert_eq!(
            resolver.get_pool_for_account("TMember", 3).await.unwrap(),
            Some("TPool".to_string())
        );
    }
}
