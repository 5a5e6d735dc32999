//! Durable per-run trade log.
//!
//! One CSV file per run, header written once at creation, one row per trade
//! attempt. Runs as a drain loop on the record channel so the scheduler never
//! waits on disk.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::session::types::TradeRecord;

const HEADER: [&str; 9] = [
    "timestamp",
    "wallet",
    "direction",
    "size",
    "status",
    "active_branches",
    "thread_count",
    "transaction_hash",
    "error",
];

pub struct TradeRecorder {
    path: PathBuf,
    writer: csv::Writer<File>,
    record_rx: mpsc::Receiver<TradeRecord>,
}

impl TradeRecorder {
    /// Create the per-run CSV file under `dir` and write its header.
    pub fn create(
        dir: impl AsRef<Path>,
        record_rx: mpsc::Receiver<TradeRecord>,
    ) -> anyhow::Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.as_ref().join(format!("trade_results_{stamp}.csv"));

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;

        info!("🗒 trade results → {}", path.display());
        Ok(Self {
            path,
            writer,
            record_rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain loop. Ends when the scheduler drops its sender.
    pub async fn run(mut self) {
        let mut rows = 0usize;
        while let Some(record) = self.record_rx.recv().await {
            match self.write(&record) {
                Ok(()) => rows += 1,
                Err(err) => warn!("failed to record trade: {err}"),
            }
        }
        if let Err(err) = self.writer.flush() {
            warn!("failed to flush trade results: {err}");
        }
        info!("🗒 recorder done | {} row(s) in {}", rows, self.path.display());
    }

    fn write(&mut self, record: &TradeRecord) -> csv::Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}
