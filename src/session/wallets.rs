//! File-backed wallet identity store.
//!
//! One opaque private-key-like token per non-empty line. The store is
//! append-only during a run; a wallet's position (index) identifies it for
//! the lifetime of the run and is the join key for proxy binding.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::error::SwarmError;

/// Opaque wallet key token. Debug output and trade records only ever carry a
/// truncated reference.
pub struct WalletIdentity(SecretString);

impl WalletIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Raw token, for key derivation only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Truncated display form: first 10 chars plus an ellipsis.
    pub fn short_ref(&self) -> String {
        let head: String = self.expose().chars().take(10).collect();
        format!("{head}...")
    }

    /// Signing key material: optional `0x` stripped, hex decoded when the
    /// token is valid hex, raw UTF-8 bytes otherwise.
    pub fn key_material(&self) -> Vec<u8> {
        let token = self.expose();
        let stripped = token.strip_prefix("0x").unwrap_or(token);
        hex::decode(stripped).unwrap_or_else(|_| stripped.as_bytes().to_vec())
    }
}

impl Clone for WalletIdentity {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_owned())
    }
}

impl std::fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletIdentity({})", self.short_ref())
    }
}

pub struct WalletStore {
    path: PathBuf,
    wallets: Vec<WalletIdentity>,
}

impl WalletStore {
    /// Load identities from `path`. A missing file is an empty store, not an
    /// error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SwarmError> {
        let path = path.as_ref().to_path_buf();
        let wallets = if path.exists() {
            fs::read_to_string(&path)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(WalletIdentity::new)
                .collect()
        } else {
            Vec::new()
        };
        Ok(Self { path, wallets })
    }

    /// Persist a new identity and extend the in-memory sequence.
    pub fn append(&mut self, identity: WalletIdentity) -> Result<(), SwarmError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", identity.expose())?;
        self.wallets.push(identity);
        Ok(())
    }

    pub fn at(&self, index: usize) -> Result<&WalletIdentity, SwarmError> {
        self.wallets.get(index).ok_or(SwarmError::IndexOutOfRange {
            index,
            len: self.wallets.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Index-carrying snapshot. The store index survives shuffling, keeping
    /// proxy binding a pure function of a wallet's original position.
    pub fn snapshot(&self) -> Vec<(usize, WalletIdentity)> {
        self.wallets.iter().cloned().enumerate().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = WalletStore::load(dir.path().join("absent.txt")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet_keys.txt");
        fs::write(&path, "alpha\n\n  \nbeta\n").unwrap();

        let store = WalletStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.at(0).unwrap().expose(), "alpha");
        assert_eq!(store.at(1).unwrap().expose(), "beta");
    }

    #[test]
    fn test_append_persists_and_extends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet_keys.txt");

        let mut store = WalletStore::load(&path).unwrap();
        store.append(WalletIdentity::new("first")).unwrap();
        store.append(WalletIdentity::new("second")).unwrap();
        assert_eq!(store.len(), 2);

        let reloaded = WalletStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.at(1).unwrap().expose(), "second");
    }

    #[test]
    fn test_at_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet_keys.txt");
        fs::write(&path, "only\n").unwrap();

        let store = WalletStore::load(&path).unwrap();
        assert!(matches!(
            store.at(1),
            Err(SwarmError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let identity = WalletIdentity::new("0xdeadbeefcafebabe0123456789");
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("0xdeadbeef..."));
        assert!(!rendered.contains("cafebabe0123456789"));
    }

    #[test]
    fn test_key_material_hex_and_raw() {
        let hex_wallet = WalletIdentity::new("0xdeadbeef");
        assert_eq!(hex_wallet.key_material(), vec![0xde, 0xad, 0xbe, 0xef]);

        let raw_wallet = WalletIdentity::new("not-hex");
        assert_eq!(raw_wallet.key_material(), b"not-hex".to_vec());
    }

    #[test]
    fn test_snapshot_carries_store_indices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet_keys.txt");
        fs::write(&path, "a\nb\nc\n").unwrap();

        let store = WalletStore::load(&path).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[2].0, 2);
        assert_eq!(snapshot[2].1.expose(), "c");
    }
}
