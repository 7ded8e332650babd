//! tronwatch library
//!
//! Delegation event pipeline for TRON resource markets: ingests delegate
//! and reclaim transactions, detects whale and pool activity, rolls raw
//! events into durable time-series summaries, and serves sampled views
//! over REST and WebSocket.
//! This library exposes core modules for testing.

pub mod abi;
pub mod broadcast;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod models;
pub mod observer;
pub mod pools;
pub mod sampler;
pub mod settings;
pub mod whale;

// Re-export commonly used types for tests
pub use broadcast::ThrottledBroadcaster;
pub use cache::QueryCache;
pub use config::AppConfig;
pub use db::{DbPool, InsertOutcome};
pub use error::{AppError, AppResult};
pub use models::{
    ContractType, DelegationRecord, PoolDelegation, ResourceType, SummationRecord, Transaction,
    WhaleDelegation,
};
pub use observer::{IngestOutcome, TransactionObserver};
pub use pools::{PoolDelegationTracker, PoolResolver};
pub use settings::{Settings, SettingsCache};
pub use whale::WhaleDetector;
