//! Pool membership resolution, delegation tracking, and discovery

mod discovery;
mod resolver;
mod tracker;

pub use discovery::{run_discovery_loop, AccountPermission, HttpMembershipSource, MembershipSource};
pub use resolver::PoolResolver;
pub use tracker::PoolDelegationTracker;
