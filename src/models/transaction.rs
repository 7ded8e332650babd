//! Incoming transaction envelope
//!
//! The upstream block-sync pipeline delivers already-parsed transactions.
//! Only the fields the delegation pipeline consumes are modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contract type of a parsed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    /// Resource delegation (energy or bandwidth granted to another account)
    #[serde(rename = "DelegateResourceContract")]
    DelegateResource,
    /// Resource reclaim (a previously granted delegation revoked)
    #[serde(rename = "UnDelegateResourceContract")]
    UndelegateResource,
    /// Smart contract call (carries a raw ABI payload)
    #[serde(rename = "TriggerSmartContract")]
    TriggerSmartContract,
    /// Anything else the sync pipeline forwards
    #[serde(untagged)]
    Other(String),
}

impl ContractType {
    /// True for the two contract types the pipeline ingests
    pub fn is_delegation(&self) -> bool {
        matches!(
            self,
            ContractType::DelegateResource | ContractType::UndelegateResource
        )
    }
}

/// Resource kind being delegated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Bandwidth,
    Energy,
}

impl ResourceType {
    /// Stable integer code used in storage and query params
    pub fn code(&self) -> i64 {
        match self {
            ResourceType::Bandwidth => 0,
            ResourceType::Energy => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ResourceType::Bandwidth),
            1 => Some(ResourceType::Energy),
            _ => None,
        }
    }

    /// Classify the contract's declared resource field. The chain protocol
    /// omits the field for BANDWIDTH, so absence and unknown values both
    /// classify as bandwidth.
    pub fn from_contract_field(resource: Option<&str>) -> Self {
        match resource {
            Some("ENERGY") => ResourceType::Energy,
            _ => ResourceType::Bandwidth,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Bandwidth => write!(f, "BANDWIDTH"),
            ResourceType::Energy => write!(f, "ENERGY"),
        }
    }
}

/// Contract parameters surfaced by the sync pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractParameters {
    /// Declared resource ("ENERGY" or absent for bandwidth)
    #[serde(default)]
    pub resource: Option<String>,
    /// Whether the delegation carries a lock
    #[serde(default)]
    pub lock: Option<bool>,
    /// Lock period in blocks, when locked
    #[serde(default)]
    pub lock_period: Option<i64>,
    /// Raw ABI payload for TriggerSmartContract transactions (hex)
    #[serde(default)]
    pub data: Option<String>,
}

/// One parsed transaction from the block-sync pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id (globally unique)
    pub tx_id: String,
    /// Block timestamp
    pub timestamp: DateTime<Utc>,
    /// Block height
    pub block_number: i64,
    /// Resource owner (delegator)
    pub from_address: String,
    /// Resource receiver
    pub to_address: String,
    /// Contract type
    pub contract_type: ContractType,
    /// Amount in SUN as carried on-chain (unsigned magnitude)
    pub amount_sun: i64,
    /// Authorizing permission id from the raw transaction envelope
    #[serde(default)]
    pub permission_id: i64,
    /// Contract parameters
    #[serde(default)]
    pub parameters: ContractParameters,
}

impl Transaction {
    /// Signed amount: delegate => positive, reclaim => negative
    pub fn signed_amount_sun(&self) -> i64 {
        match self.contract_type {
            ContractType::UndelegateResource => -self.amount_sun.abs(),
            _ => self.amount_sun.abs(),
        }
    }

    /// Resource type classified from the contract's declared field
    pub fn resource_type(&self) -> ResourceType {
        ResourceType::from_contract_field(self.parameters.resource.as_deref())
    }
}
