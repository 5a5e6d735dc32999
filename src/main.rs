//! Session runner: load config and pools, wire the recorder, run one session.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wallet_swarm::config::RunConfig;
use wallet_swarm::session::executor::{ExecutorConfig, TradeExecutor};
use wallet_swarm::session::proxy::ProxyPool;
use wallet_swarm::session::recorder::TradeRecorder;
use wallet_swarm::session::scheduler::SessionScheduler;
use wallet_swarm::session::wallets::WalletStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cfg = RunConfig::from_env()?;
    info!(
        "🐝 wallet-swarm | mode={:?} proxy={:?} assets={:?}",
        cfg.execution_mode, cfg.proxy_kind, cfg.trading_assets,
    );

    let wallets = WalletStore::load(&cfg.keys_file)?;
    if wallets.is_empty() {
        warn!("no wallets in {}; nothing to do", cfg.keys_file.display());
        return Ok(());
    }
    let proxies = ProxyPool::load(&cfg.proxy_file, cfg.proxy_kind)?;

    let (record_tx, record_rx) = mpsc::channel(256);
    let recorder = TradeRecorder::create("trade_results", record_rx)?;
    let recorder_handle = tokio::spawn(recorder.run());

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("✋ ctrl-c — cancelling run");
            ctrl_c_cancel.cancel();
        }
    });

    let executor = TradeExecutor::new(ExecutorConfig::default(), StdRng::from_entropy());
    let scheduler = SessionScheduler::new(
        cfg,
        wallets,
        proxies,
        executor,
        record_tx,
        StdRng::from_entropy(),
        cancel,
    );
    let stats = scheduler.run_session().await?;

    // The scheduler dropped its sender; wait for the recorder to flush.
    let _ = recorder_handle.await;

    info!(
        "🏁 run complete | branches={} attempted={} failed={} unscheduled={} cancelled={}",
        stats.branches_opened, stats.attempted, stats.failed, stats.unscheduled, stats.cancelled,
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var("SWARM_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wallet-swarm.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // The flush guard must outlive the run.
            Box::leak(Box::new(guard));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}
