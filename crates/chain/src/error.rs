//! Error taxonomy for chain backends.

use thiserror::Error;

/// Errors surfaced by chain backends.
///
/// Transient variants cover transport-level failures where the request
/// may simply be repeated; everything else is fatal and must not be
/// retried blindly.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("request to {endpoint} timed out after {seconds}s")]
    Timeout { endpoint: String, seconds: u64 },

    #[error("failed to reach {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("failed to spawn {command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("signer failed: {0}")]
    Signer(String),

    #[error("wallet command failed with status {status}: {stderr}")]
    WalletCommand { status: i32, stderr: String },

    #[error("operation not supported by the {0} backend")]
    Unsupported(&'static str),
}

impl ChainError {
    /// Whether a read-only call hitting this error may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainError::Timeout { .. } | ChainError::Connect { .. } | ChainError::Spawn { .. }
        )
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
