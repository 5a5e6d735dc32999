//! Simulated multi-wallet trading orchestration.
//!
//! Runs batches of simulated trades across many wallet identities, each bound
//! to a network proxy by its wallet-store index. The scheduler partitions
//! wallets into branches or pacing batches, the executor signs a
//! deterministic stand-in transaction, and every attempt lands as one row in
//! the per-run results CSV.

pub mod config;
pub mod error;
pub mod session;

pub use config::RunConfig;
pub use error::SwarmError;
