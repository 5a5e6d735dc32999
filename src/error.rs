//! Typed errors for session setup and lookups.
//!
//! Business-rule rejections (insufficient balance) are NOT errors; they come
//! back as failed trade results. These variants cover structural faults that
//! stop a run before it starts, plus out-of-bounds lookups.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    /// A proxy line matched neither `endpoint@credential` nor
    /// `endpoint@credential|refreshLink`.
    #[error("malformed proxy line {line_no}: {reason}")]
    MalformedProxyLine { line_no: usize, reason: String },

    /// Proxy resolution against zero loaded proxies.
    #[error("proxy pool is empty")]
    EmptyPool,

    /// Wallet lookup past the end of the store.
    #[error("wallet index {index} out of range (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Run configuration rejected at construction.
    #[error("invalid run config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
