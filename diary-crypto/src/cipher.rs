//! AES-256-CTR symmetric encryption.
//!
//! Stream-cipher semantics: output length equals input length, there is no
//! nonce in the ciphertext and no authentication tag. Every message starts
//! the 128-bit big-endian counter at 1, which is what the stored data was
//! produced with. Do not switch to an AEAD here without a migration path:
//! existing ciphertext would become unreadable.

use crate::codec::{bytes_to_text, decode_base64, encode_base64};
use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use ctr::cipher::{KeyIvInit, StreamCipher};

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

const INITIAL_COUNTER: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

fn apply_keystream(key: &SymmetricKey, data: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut cipher = Aes256Ctr::new_from_slices(key.as_bytes(), &INITIAL_COUNTER)
        .map_err(|e| CryptoError::InvalidKeyMaterial(format!("aes-ctr init: {e}")))?;
    let mut buf = data.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

/// Encrypts `plaintext` under `key`.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    apply_keystream(key, plaintext)
}

/// Decrypts `ciphertext` under `key`. A wrong key yields garbage, not an error.
pub fn decrypt(key: &SymmetricKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    apply_keystream(key, ciphertext)
}

/// UTF-8 encodes, encrypts and Base64-encodes a text field.
pub fn encrypt_text(key: &SymmetricKey, plaintext: &str) -> CryptoResult<String> {
    Ok(encode_base64(&encrypt(key, plaintext.as_bytes())?))
}

/// Reverses [`encrypt_text`].
///
/// Fails with [`CryptoError::Encoding`] when the ciphertext is not Base64 or
/// the decrypted bytes are not UTF-8 (usually a sign of the wrong key).
pub fn decrypt_text(key: &SymmetricKey, ciphertext: &str) -> CryptoResult<String> {
    let bytes = decrypt(key, &decode_base64(ciphertext)?)?;
    bytes_to_text(bytes)
}

/// Wraps `inner` under `outer` and Base64-encodes the result.
pub fn wrap_key(outer: &SymmetricKey, inner: &SymmetricKey) -> CryptoResult<String> {
    Ok(encode_base64(&encrypt(outer, inner.as_bytes())?))
}

/// Reverses [`wrap_key`].
pub fn unwrap_key(outer: &SymmetricKey, wrapped: &str) -> CryptoResult<SymmetricKey> {
    let bytes = zeroize::Zeroizing::new(decrypt(outer, &decode_base64(wrapped)?)?);
    SymmetricKey::from_slice(&bytes)
}
