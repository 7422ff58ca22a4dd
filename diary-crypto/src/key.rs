//! Symmetric key material and password-based key derivation.

use crate::error::{CryptoError, CryptoResult};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of every symmetric key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of a freshly generated account salt in bytes.
pub const SALT_SIZE: usize = 16;

/// A 256-bit symmetric key: either the master key or a diary key.
///
/// Zeroized on drop; `Debug` never prints the key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { key: bytes }
    }

    /// Builds a key from a slice, rejecting anything that is not exactly
    /// [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let key: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Per-account salt for master key derivation. Not secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let salt: [u8; SALT_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::KeyDerivation(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(salt))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// PBKDF2 parameters. Must match what the server stored for the account,
/// otherwise login derives a different master key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// PBKDF2-HMAC-SHA512 iteration count.
    pub iterations: u32,
}

impl Default for KdfParams {
    /// A single iteration, as used by every account created so far.
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

/// Derives the master key from a password and salt.
///
/// Deterministic: the same `(password, salt, params)` always yields the
/// same key.
pub fn derive_master_key(
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<SymmetricKey> {
    if params.iterations == 0 {
        return Err(CryptoError::KeyDerivation(
            "iteration count must be at least 1".to_string(),
        ));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), params.iterations, &mut key);

    let derived = SymmetricKey::from_bytes(key);
    key.zeroize();
    Ok(derived)
}

/// Generates a random symmetric key (used for diary keys).
pub fn generate_symmetric_key() -> SymmetricKey {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    let generated = SymmetricKey::from_bytes(key);
    key.zeroize();
    generated
}
