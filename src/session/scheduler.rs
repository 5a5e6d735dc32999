//! Session orchestration core.
//!
//! Two mutually exclusive scheduling algorithms over one wallet snapshot:
//!
//! * **Branch mode**: consume randomly sized contiguous branches, split each
//!   into non-empty long/short subsets sharing one evenly divided total size.
//! * **Parallel mode**: fixed `thread_count` pacing batches, per-wallet
//!   launch delay, direction and size from the configured policy.
//!
//! Proxies always bind by original wallet-store index, so the mapping stays
//! reproducible regardless of shuffling. Every attempted trade emits exactly
//! one record on the sink channel; per-wallet failures never abort the run.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::SwarmError;
use crate::session::executor::TradeExecutor;
use crate::session::proxy::ProxyPool;
use crate::session::types::{
    Direction, DirectionPolicy, ExecutionMode, SessionStats, TradeRecord, TradeStatus,
};
use crate::session::wallets::{WalletIdentity, WalletStore};

pub struct SessionScheduler {
    cfg: RunConfig,
    wallets: WalletStore,
    proxies: ProxyPool,
    executor: TradeExecutor,
    record_tx: mpsc::Sender<TradeRecord>,
    rng: StdRng,
    cancel: CancellationToken,
    stats: SessionStats,
}

impl SessionScheduler {
    pub fn new(
        cfg: RunConfig,
        wallets: WalletStore,
        proxies: ProxyPool,
        executor: TradeExecutor,
        record_tx: mpsc::Sender<TradeRecord>,
        rng: StdRng,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            wallets,
            proxies,
            executor,
            record_tx,
            rng,
            cancel,
            stats: SessionStats::default(),
        }
    }

    /// One full pass over the current wallet set.
    pub async fn run_session(mut self) -> Result<SessionStats, SwarmError> {
        if self.proxies.is_empty() {
            return Err(SwarmError::EmptyPool);
        }

        info!(
            "🚀 session start | mode={:?} wallets={} proxies={} shuffle={}",
            self.cfg.execution_mode,
            self.wallets.len(),
            self.proxies.len(),
            self.cfg.enable_shuffling,
        );

        match self.cfg.execution_mode {
            ExecutionMode::Branch => self.run_branch_trading().await,
            ExecutionMode::Parallel => self.run_parallel_trading().await,
        }

        info!(
            "🏁 session done | branches={} attempted={} failed={} unscheduled={} cancelled={}",
            self.stats.branches_opened,
            self.stats.attempted,
            self.stats.failed,
            self.stats.unscheduled,
            self.stats.cancelled,
        );
        Ok(self.stats)
    }

    // ─────────────────────────────────────────────────
    // Branch mode
    // ─────────────────────────────────────────────────

    async fn run_branch_trading(&mut self) {
        let mut remaining = self.wallets.snapshot();
        if self.cfg.enable_shuffling {
            remaining.shuffle(&mut self.rng);
        }
        let (min_size, max_size) = self.cfg.branch_wallet_range;

        'run: while !remaining.is_empty()
            && self.stats.branches_opened < self.cfg.max_parallel_branches
        {
            if self.cancel.is_cancelled() {
                warn!("✋ run cancelled between branches");
                self.stats.cancelled = true;
                break;
            }

            let branch_size = self.rng.gen_range(min_size..=max_size);
            if remaining.len() < branch_size {
                debug!(
                    "remainder {} < drawn branch size {}; stopping",
                    remaining.len(),
                    branch_size,
                );
                break;
            }

            let branch: Vec<(usize, WalletIdentity)> = remaining.drain(..branch_size).collect();
            let long_count = self.rng.gen_range(1..=branch_size - 1);
            let short_count = branch_size - long_count;

            // One total for the whole branch, fixed before the split.
            let total_size = self.sample_trade_size();
            let long_size = total_size / long_count as f64;
            let short_size = total_size / short_count as f64;

            self.stats.branches_opened += 1;
            let branch_no = self.stats.branches_opened;
            info!(
                "🌿 branch {} | size={} long={}x{:.2} short={}x{:.2}",
                branch_no, branch_size, long_count, long_size, short_count, short_size,
            );

            // Longs first, then shorts.
            for (pos, (store_index, wallet)) in branch.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    warn!("✋ run cancelled mid-branch; emitted results stand");
                    self.stats.cancelled = true;
                    break 'run;
                }
                let (direction, size) = if pos < long_count {
                    (Direction::Long, long_size)
                } else {
                    (Direction::Short, short_size)
                };
                if !self.trade_one(*store_index, wallet, direction, size, branch_no).await {
                    self.stats.cancelled = true;
                    break 'run;
                }
            }
        }

        self.stats.unscheduled = remaining.len();
    }

    // ─────────────────────────────────────────────────
    // Parallel mode
    // ─────────────────────────────────────────────────

    async fn run_parallel_trading(&mut self) {
        let mut snapshot = self.wallets.snapshot();
        if self.cfg.enable_shuffling {
            snapshot.shuffle(&mut self.rng);
        }
        let (delay_min, delay_max) = self.cfg.launch_delay_range;
        let total = snapshot.len();
        let mut processed = 0usize;

        'run: for (batch_no, batch) in snapshot.chunks(self.cfg.thread_count).enumerate() {
            debug!("batch {} | {} wallet(s)", batch_no + 1, batch.len());
            for (store_index, wallet) in batch {
                if self.cancel.is_cancelled() {
                    warn!("✋ run cancelled between wallets");
                    self.stats.cancelled = true;
                    break 'run;
                }

                let delay = self.rng.gen_range(delay_min..=delay_max);
                if !self.pause(Duration::from_secs_f64(delay)).await {
                    warn!("✋ run cancelled during launch delay");
                    self.stats.cancelled = true;
                    break 'run;
                }

                let direction = self.sample_direction();
                let size = self.sample_trade_size();
                if !self.trade_one(*store_index, wallet, direction, size, 0).await {
                    self.stats.cancelled = true;
                    break 'run;
                }
                processed += 1;
            }
        }

        self.stats.unscheduled = total - processed;
    }

    // ─────────────────────────────────────────────────
    // Shared policy
    // ─────────────────────────────────────────────────

    /// Direction policy, identical for every code path that samples it.
    fn sample_direction(&mut self) -> Direction {
        match self.cfg.position_direction {
            DirectionPolicy::Random => {
                if self.rng.gen_bool(0.5) {
                    Direction::Long
                } else {
                    Direction::Short
                }
            }
            DirectionPolicy::Fixed(direction) => direction,
        }
    }

    /// Trade size policy: uniform over the configured volume range. Branch
    /// mode uses it for the pre-split branch total, parallel mode per wallet.
    fn sample_trade_size(&mut self) -> f64 {
        let (min, max) = self.cfg.volume_percentage_range;
        self.rng.gen_range(min..=max)
    }

    // ─────────────────────────────────────────────────
    // Per-wallet plumbing
    // ─────────────────────────────────────────────────

    /// Execute one wallet trade and forward its record. Returns false when
    /// the run was cancelled while the trade was in flight.
    async fn trade_one(
        &mut self,
        store_index: usize,
        wallet: &WalletIdentity,
        direction: Direction,
        size: f64,
        active_branches: usize,
    ) -> bool {
        let proxy = match self.proxies.resolve(store_index).await {
            Ok(proxy) => proxy,
            Err(err) => {
                // Unreachable in a started session: an empty pool is rejected
                // before any work.
                warn!("proxy resolution failed for wallet {}: {err}", store_index);
                return true;
            }
        };

        // Non-empty by config validation.
        let asset_idx = self.rng.gen_range(0..self.cfg.trading_assets.len());
        let asset = self.cfg.trading_assets[asset_idx].clone();

        let cancel = self.cancel.clone();
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                warn!("✋ cancelled while trade in flight for {}", wallet.short_ref());
                return false;
            }
            result = self.executor.execute(wallet, &asset, direction, size, &proxy) => result,
        };

        self.stats.attempted += 1;
        match result.status {
            TradeStatus::Success => info!(
                "✅ trade ok | wallet={} {} {} size={:.2} tx={}",
                result.wallet_ref, result.asset, result.direction, result.size, result.tx_id,
            ),
            TradeStatus::Failed => {
                self.stats.failed += 1;
                warn!(
                    "❌ trade failed | wallet={} {} — {}",
                    result.wallet_ref,
                    result.asset,
                    result.error.as_deref().unwrap_or("unknown"),
                );
            }
        }

        let record = TradeRecord::from_result(&result, active_branches, self.cfg.thread_count);
        if self.record_tx.send(record).await.is_err() {
            warn!("record sink closed; dropping trade record");
        }
        true
    }

    /// Cancellable sleep. Returns false when the run was cancelled mid-pause.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
