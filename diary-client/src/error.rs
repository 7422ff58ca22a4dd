//! Client error types.

use diary_crypto::CryptoError;
use thiserror::Error;

/// Result type for diary client operations.
pub type DiaryResult<T> = Result<T, DiaryError>;

/// Errors surfaced by the diary client. None of them are retried or
/// swallowed internally.
///
/// Decrypting under the wrong diary key is not represented: the cipher
/// cannot detect it, so it shows up as garbled content (or an
/// [`CryptoError::Encoding`] failure when the garbage is not UTF-8).
#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("diary key for diary {0} was not found")]
    DiaryKeyNotFound(String),

    #[error("sharing task for diary {0} was not found")]
    SharingTaskNotFound(String),

    #[error("remote call failed with status {status}: {body}")]
    RemoteCall { status: u16, body: String },

    #[error("authentication required")]
    AuthRequired,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid path segment: {0:?}")]
    InvalidPathSegment(String),
}

impl DiaryError {
    /// HTTP status of a failed remote call, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DiaryError::RemoteCall { status, .. } => Some(*status),
            _ => None,
        }
    }
}
