//! Proxy pool with deterministic index-based account binding.
//!
//! Line shapes:
//!   `endpoint@credential`               (static proxy)
//!   `endpoint@credential|refreshLink`   (rotating proxy)
//!
//! Binding is `account_index % pool_size`, so proxy reuse once wallets
//! outnumber proxies is deliberate, not accidental.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::error::SwarmError;
use crate::session::types::ProxyKind;

const REFRESH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ProxyRecord {
    /// host:port
    pub endpoint: String,
    pub credential: String,
    /// Present on rotating proxies only.
    pub refresh_link: Option<Url>,
}

impl ProxyRecord {
    pub fn is_rotating(&self) -> bool {
        self.refresh_link.is_some()
    }

    fn parse(line: &str, line_no: usize) -> Result<Self, SwarmError> {
        let malformed = |reason: String| SwarmError::MalformedProxyLine { line_no, reason };

        let (proxy_data, refresh_link) = match line.split_once('|') {
            Some((data, link)) => {
                let url = Url::parse(link.trim())
                    .map_err(|err| malformed(format!("bad refresh link: {err}")))?;
                (data, Some(url))
            }
            None => (line, None),
        };

        let (endpoint, credential) = proxy_data
            .split_once('@')
            .ok_or_else(|| malformed("expected endpoint@credential".to_string()))?;
        if endpoint.trim().is_empty() || credential.trim().is_empty() {
            return Err(malformed("empty endpoint or credential".to_string()));
        }

        Ok(Self {
            endpoint: endpoint.trim().to_string(),
            credential: credential.trim().to_string(),
            refresh_link,
        })
    }
}

#[derive(Debug)]
pub struct ProxyPool {
    kind: ProxyKind,
    proxies: Vec<ProxyRecord>,
    http: reqwest::Client,
}

impl ProxyPool {
    /// Load and validate the proxy list. Any malformed line is fatal.
    pub fn load(path: impl AsRef<Path>, kind: ProxyKind) -> Result<Self, SwarmError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let mut proxies = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            proxies.push(ProxyRecord::parse(line, idx + 1)?);
        }
        Ok(Self::from_records(proxies, kind))
    }

    pub fn from_records(proxies: Vec<ProxyRecord>, kind: ProxyKind) -> Self {
        Self {
            kind,
            proxies,
            http: reqwest::Client::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Deterministic account binding: `account_index % len`. Rotating records
    /// in a mobile pool are refreshed best-effort before being handed out.
    pub async fn resolve(&self, account_index: usize) -> Result<ProxyRecord, SwarmError> {
        if self.proxies.is_empty() {
            return Err(SwarmError::EmptyPool);
        }
        let record = &self.proxies[account_index % self.proxies.len()];
        if self.kind == ProxyKind::Mobile {
            if let Some(link) = &record.refresh_link {
                self.refresh(&record.endpoint, link).await;
            }
        }
        Ok(record.clone())
    }

    /// Fire the rotation request. Best-effort: a failure is logged and the
    /// (possibly stale) record is still handed out.
    async fn refresh(&self, endpoint: &str, link: &Url) {
        match self
            .http
            .get(link.clone())
            .timeout(REFRESH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => debug!("🔄 refreshed proxy {} (status={})", endpoint, resp.status()),
            Err(err) => warn!("proxy refresh failed for {}: {err} — reusing current egress", endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn static_pool(n: usize) -> ProxyPool {
        let records = (0..n)
            .map(|i| ProxyRecord {
                endpoint: format!("10.0.0.{i}:8080"),
                credential: format!("user{i}:pass{i}"),
                refresh_link: None,
            })
            .collect();
        ProxyPool::from_records(records, ProxyKind::Regular)
    }

    #[test]
    fn test_load_static_and_rotating_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        std::fs::write(
            &path,
            "1.1.1.1:80@u1:p1\n2.2.2.2:8080@u2:p2|http://rotate.example/refresh?key=abc\n",
        )
        .unwrap();

        let pool = ProxyPool::load(&path, ProxyKind::Mobile).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(!pool.proxies[0].is_rotating());
        assert!(pool.proxies[1].is_rotating());
        assert_eq!(pool.proxies[1].endpoint, "2.2.2.2:8080");
        assert_eq!(pool.proxies[1].credential, "u2:p2");
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        std::fs::write(&path, "1.1.1.1:80@u1:p1\nno-credential-here\n").unwrap();

        let err = ProxyPool::load(&path, ProxyKind::Regular).unwrap_err();
        assert!(matches!(err, SwarmError::MalformedProxyLine { line_no: 2, .. }));
    }

    #[test]
    fn test_bad_refresh_link_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        std::fs::write(&path, "1.1.1.1:80@u1:p1|not a url\n").unwrap();

        let err = ProxyPool::load(&path, ProxyKind::Mobile).unwrap_err();
        assert!(matches!(err, SwarmError::MalformedProxyLine { line_no: 1, .. }));
    }

    #[tokio::test]
    async fn test_resolve_wraps_modulo_pool_size() {
        let pool = static_pool(3);
        for index in 0..9 {
            let record = pool.resolve(index).await.unwrap();
            assert_eq!(record.endpoint, format!("10.0.0.{}:8080", index % 3));
        }
    }

    #[tokio::test]
    async fn test_resolve_is_reproducible() {
        let pool = static_pool(2);
        let first = pool.resolve(7).await.unwrap();
        let again = pool.resolve(7).await.unwrap();
        assert_eq!(first.endpoint, again.endpoint);
        assert_eq!(first.endpoint, "10.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_empty_pool_rejects_any_index() {
        let pool = static_pool(0);
        for index in [0, 1, 42] {
            assert!(matches!(pool.resolve(index).await, Err(SwarmError::EmptyPool)));
        }
    }
}
