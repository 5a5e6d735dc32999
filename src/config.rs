//! Run configuration.
//!
//! Strongly typed, validated at construction: out-of-range or unknown values
//! are rejected up front, never silently defaulted mid-run.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SwarmError;
use crate::session::types::{DirectionPolicy, ExecutionMode, ProxyKind};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub keys_file: PathBuf,
    pub proxy_file: PathBuf,
    pub proxy_kind: ProxyKind,
    pub execution_mode: ExecutionMode,
    pub enable_shuffling: bool,
    /// Wallets per pacing batch in parallel mode.
    pub thread_count: usize,
    /// Per-wallet launch delay bounds, seconds (parallel mode).
    pub launch_delay_range: (f64, f64),
    /// Wallets per branch, inclusive bounds (branch mode).
    pub branch_wallet_range: (usize, usize),
    pub max_parallel_branches: usize,
    pub trading_assets: Vec<String>,
    pub position_direction: DirectionPolicy,
    /// Trade size bounds, inclusive.
    pub volume_percentage_range: (f64, f64),

    // Carried for config-surface compatibility. The simulated executor never
    // consults these; no retry semantics exist.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub gas_limit: u64,
    pub slippage_tolerance: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            keys_file: "wallet_keys.txt".into(),
            proxy_file: "proxies.txt".into(),
            proxy_kind: ProxyKind::Regular,
            execution_mode: ExecutionMode::Branch,
            enable_shuffling: true,
            thread_count: 10,
            launch_delay_range: (0.0, 3600.0),
            branch_wallet_range: (2, 5),
            max_parallel_branches: 5,
            trading_assets: vec!["BTC".into(), "ETH".into(), "SOL".into()],
            position_direction: DirectionPolicy::Random,
            volume_percentage_range: (10.0, 50.0),
            max_retries: 3,
            retry_delay_secs: 5,
            gas_limit: 300_000,
            slippage_tolerance: 0.5,
        }
    }
}

impl RunConfig {
    /// Defaults overridden from `SWARM_*` environment variables, then
    /// validated. A value that does not parse is an error, not a fallback.
    pub fn from_env() -> Result<Self, SwarmError> {
        let mut cfg = Self::default();

        if let Ok(v) = env::var("SWARM_KEYS_FILE") {
            cfg.keys_file = v.into();
        }
        if let Ok(v) = env::var("SWARM_PROXY_FILE") {
            cfg.proxy_file = v.into();
        }
        if let Ok(v) = env::var("SWARM_PROXY_TYPE") {
            cfg.proxy_kind = v.parse()?;
        }
        if let Ok(v) = env::var("SWARM_EXECUTION_MODE") {
            cfg.execution_mode = v.parse()?;
        }
        if let Ok(v) = env::var("SWARM_ENABLE_SHUFFLING") {
            cfg.enable_shuffling = v != "0" && v.to_lowercase() != "false";
        }
        if let Some(v) = parse_var("SWARM_THREAD_COUNT")? {
            cfg.thread_count = v;
        }
        if let Some(v) = parse_var("SWARM_LAUNCH_DELAY_MIN")? {
            cfg.launch_delay_range.0 = v;
        }
        if let Some(v) = parse_var("SWARM_LAUNCH_DELAY_MAX")? {
            cfg.launch_delay_range.1 = v;
        }
        if let Some(v) = parse_var("SWARM_BRANCH_WALLETS_MIN")? {
            cfg.branch_wallet_range.0 = v;
        }
        if let Some(v) = parse_var("SWARM_BRANCH_WALLETS_MAX")? {
            cfg.branch_wallet_range.1 = v;
        }
        if let Some(v) = parse_var("SWARM_MAX_PARALLEL_BRANCHES")? {
            cfg.max_parallel_branches = v;
        }
        if let Ok(v) = env::var("SWARM_TRADING_ASSETS") {
            cfg.trading_assets = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SWARM_POSITION_DIRECTION") {
            cfg.position_direction = v.parse()?;
        }
        if let Some(v) = parse_var("SWARM_VOLUME_MIN")? {
            cfg.volume_percentage_range.0 = v;
        }
        if let Some(v) = parse_var("SWARM_VOLUME_MAX")? {
            cfg.volume_percentage_range.1 = v;
        }
        if let Some(v) = parse_var("SWARM_MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = parse_var("SWARM_RETRY_DELAY")? {
            cfg.retry_delay_secs = v;
        }
        if let Some(v) = parse_var("SWARM_GAS_LIMIT")? {
            cfg.gas_limit = v;
        }
        if let Some(v) = parse_var("SWARM_SLIPPAGE_TOLERANCE")? {
            cfg.slippage_tolerance = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SwarmError> {
        if self.thread_count == 0 {
            return Err(SwarmError::InvalidConfig("thread_count must be > 0".into()));
        }
        if self.max_parallel_branches == 0 {
            return Err(SwarmError::InvalidConfig(
                "max_parallel_branches must be > 0".into(),
            ));
        }
        let (delay_min, delay_max) = self.launch_delay_range;
        if delay_min < 0.0 || delay_min > delay_max {
            return Err(SwarmError::InvalidConfig(
                "launch_delay_range must satisfy 0 <= min <= max".into(),
            ));
        }
        let (branch_min, branch_max) = self.branch_wallet_range;
        if branch_min < 2 {
            return Err(SwarmError::InvalidConfig(
                "branch_wallet_range min must be >= 2 (a branch needs a long and a short)".into(),
            ));
        }
        if branch_min > branch_max {
            return Err(SwarmError::InvalidConfig(
                "branch_wallet_range must satisfy min <= max".into(),
            ));
        }
        if self.trading_assets.is_empty() {
            return Err(SwarmError::InvalidConfig(
                "trading_assets must not be empty".into(),
            ));
        }
        let (volume_min, volume_max) = self.volume_percentage_range;
        if volume_min < 0.0 || volume_min > volume_max {
            return Err(SwarmError::InvalidConfig(
                "volume_percentage_range must satisfy 0 <= min <= max".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, SwarmError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SwarmError::InvalidConfig(format!("{key}: cannot parse {raw:?}"))),
        Err(_) => Ok(None),
    }
}
