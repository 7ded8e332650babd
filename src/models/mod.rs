//! Data models for tronwatch

mod delegation;
mod transaction;

pub use delegation::{
    DelegationRecord, PoolDelegation, PoolMembership, SummationRecord, WhaleDelegation,
};
pub use transaction::{ContractParameters, ContractType, ResourceType, Transaction};

/// SUN per TRX (the chain's base unit)
pub const SUN_PER_TRX: i64 = 1_000_000;

/// Permission ids 0-2 are reserved for owner/witness slots; ids >= 3 are
/// custom active permissions and indicate pool-controlled authorization.
pub const FIRST_POOL_PERMISSION_ID: i64 = 3;
