//! Simulated trade execution.
//!
//! No exchange round-trip: a trade is a balance-policy check, a latency pause
//! and a deterministic HMAC-SHA256 signature over the canonical payload.
//! Every attempt returns a `TradeResult`; internal faults are captured into a
//! failed result, never propagated.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::rngs::StdRng;
use rand::Rng;
use sha2::Sha256;
use tracing::debug;

use crate::session::proxy::ProxyRecord;
use crate::session::types::{Direction, TradeResult, TradeStatus};
use crate::session::wallets::WalletIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Balance ceiling standing in for real validation.
const MAX_POSITION_SIZE: f64 = 10_000.0;

/// Browser fingerprints rotated across simulated submissions.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
    "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36",
];

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Sizes above this come back as insufficient balance.
    pub max_position_size: f64,
    /// Simulated confirmation-delay bounds, seconds.
    pub latency_range: (f64, f64),
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_position_size: MAX_POSITION_SIZE,
            latency_range: (0.5, 2.0),
        }
    }
}

pub struct TradeExecutor {
    cfg: ExecutorConfig,
    rng: StdRng,
}

impl TradeExecutor {
    pub fn new(cfg: ExecutorConfig, rng: StdRng) -> Self {
        Self { cfg, rng }
    }

    /// Run one simulated trade. Infallible surface: anything that goes wrong
    /// inside comes back as a failed result carrying the error text.
    pub async fn execute(
        &mut self,
        wallet: &WalletIdentity,
        asset: &str,
        direction: Direction,
        size: f64,
        proxy: &ProxyRecord,
    ) -> TradeResult {
        let tx_id = format!(
            "tx_{}_{}",
            Utc::now().timestamp(),
            self.rng.gen_range(1000..=9999)
        );

        if size > self.cfg.max_position_size {
            return TradeResult {
                status: TradeStatus::Failed,
                timestamp: Utc::now(),
                tx_id,
                signature: None,
                asset: asset.to_string(),
                direction,
                size,
                wallet_ref: wallet.short_ref(),
                error: Some("Insufficient balance".to_string()),
            };
        }

        let user_agent = USER_AGENTS[self.rng.gen_range(0..USER_AGENTS.len())];
        debug!(
            "🛰 submitting {} {} size={:.2} via {} ua={:?}",
            direction, asset, size, proxy.endpoint, user_agent
        );

        // Network/confirmation-delay stand-in.
        let (lo, hi) = self.cfg.latency_range;
        let latency = self.rng.gen_range(lo..=hi);
        tokio::time::sleep(Duration::from_secs_f64(latency)).await;

        match sign_payload(wallet, &tx_id, asset, direction, size) {
            Ok(signature) => TradeResult {
                status: TradeStatus::Success,
                timestamp: Utc::now(),
                tx_id,
                signature: Some(signature),
                asset: asset.to_string(),
                direction,
                size,
                wallet_ref: wallet.short_ref(),
                error: None,
            },
            Err(err) => TradeResult {
                status: TradeStatus::Failed,
                timestamp: Utc::now(),
                tx_id,
                signature: None,
                asset: asset.to_string(),
                direction,
                size,
                wallet_ref: wallet.short_ref(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// Deterministic signature stand-in: HMAC-SHA256 over
/// `"{tx_id}:{asset}:{direction}:{size}"` keyed by the wallet's key material,
/// base64-encoded. Same key and message always yield the same token.
pub fn sign_payload(
    wallet: &WalletIdentity,
    tx_id: &str,
    asset: &str,
    direction: Direction,
    size: f64,
) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(&wallet.key_material())?;
    mac.update(format!("{tx_id}:{asset}:{direction}:{size}").as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn instant_executor() -> TradeExecutor {
        TradeExecutor::new(
            ExecutorConfig {
                latency_range: (0.0, 0.0),
                ..ExecutorConfig::default()
            },
            StdRng::seed_from_u64(7),
        )
    }

    fn proxy() -> ProxyRecord {
        ProxyRecord {
            endpoint: "1.1.1.1:80".to_string(),
            credential: "u:p".to_string(),
            refresh_link: None,
        }
    }

    #[test]
    fn test_signature_is_deterministic() {
        let wallet = WalletIdentity::new("0xdeadbeefcafebabe");
        let a = sign_payload(&wallet, "tx_1_1234", "BTC", Direction::Long, 25.0).unwrap();
        let b = sign_payload(&wallet, "tx_1_1234", "BTC", Direction::Long, 25.0).unwrap();
        assert_eq!(a, b);
        // 32-byte MAC, base64.
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn test_signature_varies_with_key_and_message() {
        let wallet = WalletIdentity::new("0xdeadbeefcafebabe");
        let other = WalletIdentity::new("0xfeedfacefeedface");
        let base = sign_payload(&wallet, "tx_1_1234", "BTC", Direction::Long, 25.0).unwrap();
        assert_ne!(
            base,
            sign_payload(&other, "tx_1_1234", "BTC", Direction::Long, 25.0).unwrap()
        );
        assert_ne!(
            base,
            sign_payload(&wallet, "tx_1_1234", "BTC", Direction::Short, 25.0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_oversized_trade_fails_without_signature() {
        let mut executor = instant_executor();
        let wallet = WalletIdentity::new("0xdeadbeef");

        let result = executor
            .execute(&wallet, "BTC", Direction::Long, 15_000.0, &proxy())
            .await;
        assert_eq!(result.status, TradeStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("Insufficient balance"));
        assert!(result.signature.is_none());
        assert!(result.tx_id.starts_with("tx_"));
    }

    #[tokio::test]
    async fn test_successful_trade_carries_signature_and_redacted_ref() {
        let mut executor = instant_executor();
        let wallet = WalletIdentity::new("0xdeadbeefcafebabe0123");

        let result = executor
            .execute(&wallet, "ETH", Direction::Short, 42.0, &proxy())
            .await;
        assert_eq!(result.status, TradeStatus::Success);
        assert_eq!(result.signature.as_ref().map(String::len), Some(44));
        assert!(result.error.is_none());
        assert_eq!(result.wallet_ref, "0xdeadbeef...");
        assert!(!result.wallet_ref.contains("cafebabe"));
    }

    #[tokio::test]
    async fn test_exact_ceiling_is_allowed() {
        let mut executor = instant_executor();
        let wallet = WalletIdentity::new("0xdeadbeef");

        let result = executor
            .execute(&wallet, "SOL", Direction::Long, 10_000.0, &proxy())
            .await;
        assert_eq!(result.status, TradeStatus::Success);
    }
}
