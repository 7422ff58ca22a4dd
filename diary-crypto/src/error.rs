//! Error types for the primitive crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the primitive crypto layer.
///
/// Decrypting with the wrong symmetric key is deliberately absent: the
/// cipher has no authentication tag, so it cannot be detected here.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("payload too large for asymmetric encryption: {actual} bytes (max {max})")]
    PayloadTooLarge { max: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encoding(String),
}
