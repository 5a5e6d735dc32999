//! Shared domain types for the trading session pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SwarmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How per-wallet direction is chosen when the scheduler, not the branch
/// split, decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionPolicy {
    /// Long or short with equal probability, per wallet.
    Random,
    /// The configured direction, verbatim for every wallet.
    Fixed(Direction),
}

impl FromStr for DirectionPolicy {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(DirectionPolicy::Random),
            "long" => Ok(DirectionPolicy::Fixed(Direction::Long)),
            "short" => Ok(DirectionPolicy::Fixed(Direction::Short)),
            other => Err(SwarmError::InvalidConfig(format!(
                "unknown position direction: {other:?}"
            ))),
        }
    }
}

/// Top-level scheduling policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Randomly sized wallet branches with an intra-branch long/short split.
    Branch,
    /// Fixed-size pacing batches, one independent trade per wallet.
    Parallel,
}

impl FromStr for ExecutionMode {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "branch" => Ok(ExecutionMode::Branch),
            "parallel" => Ok(ExecutionMode::Parallel),
            other => Err(SwarmError::InvalidConfig(format!(
                "unknown execution mode: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// Static egress address.
    Regular,
    /// Rotating egress, refreshed via the record's side-channel link.
    Mobile,
}

impl FromStr for ProxyKind {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(ProxyKind::Regular),
            "mobile" => Ok(ProxyKind::Mobile),
            other => Err(SwarmError::InvalidConfig(format!(
                "unknown proxy type: {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Success,
    Failed,
}

/// Outcome of one simulated trade attempt. Immutable once produced.
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub status: TradeStatus,
    pub timestamp: DateTime<Utc>,
    pub tx_id: String,
    /// Present only on success.
    pub signature: Option<String>,
    pub asset: String,
    pub direction: Direction,
    pub size: f64,
    /// Truncated wallet reference, never the raw key.
    pub wallet_ref: String,
    pub error: Option<String>,
}

/// Flat per-attempt row consumed by the recorder. Field order matches the
/// CSV header.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub wallet: String,
    pub direction: Direction,
    pub size: f64,
    pub status: TradeStatus,
    pub active_branches: usize,
    pub thread_count: usize,
    pub transaction_hash: String,
    pub error: Option<String>,
}

impl TradeRecord {
    pub fn from_result(result: &TradeResult, active_branches: usize, thread_count: usize) -> Self {
        Self {
            timestamp: result.timestamp,
            wallet: result.wallet_ref.clone(),
            direction: result.direction,
            size: result.size,
            status: result.status,
            active_branches,
            thread_count,
            transaction_hash: result.tx_id.clone(),
            error: result.error.clone(),
        }
    }
}

/// Run summary returned by the scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionStats {
    pub branches_opened: usize,
    pub attempted: usize,
    pub failed: usize,
    /// Wallets left unscheduled when the run stopped.
    pub unscheduled: usize,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("branch".parse::<ExecutionMode>().unwrap(), ExecutionMode::Branch);
        assert_eq!("Parallel".parse::<ExecutionMode>().unwrap(), ExecutionMode::Parallel);
        assert!("threaded".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_direction_policy_parsing() {
        assert_eq!("random".parse::<DirectionPolicy>().unwrap(), DirectionPolicy::Random);
        assert_eq!(
            "LONG".parse::<DirectionPolicy>().unwrap(),
            DirectionPolicy::Fixed(Direction::Long)
        );
        assert!("sideways".parse::<DirectionPolicy>().is_err());
    }

    #[test]
    fn test_proxy_kind_parsing() {
        assert_eq!("regular".parse::<ProxyKind>().unwrap(), ProxyKind::Regular);
        assert_eq!("mobile".parse::<ProxyKind>().unwrap(), ProxyKind::Mobile);
        assert!("datacenter".parse::<ProxyKind>().is_err());
    }
}
