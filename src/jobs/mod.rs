//! Periodic background jobs

pub mod purge;
pub mod summation;

pub use purge::run_purge_job;
pub use summation::run_summation_job;
