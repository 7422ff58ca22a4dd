//! Encryption primitives for the diary client.
//!
//! Thin, stateless wrappers around audited crates:
//! - PBKDF2-HMAC-SHA512 for deriving the master key from a password
//! - AES-256-CTR for diary content and for wrapping keys under the master key
//! - RSA-OAEP for handing a diary key to another user
//! - Base64 / UTF-8 codecs for crossing into the text-only transport
//!
//! # Key hierarchy
//!
//! 1. **Master Key**: derived from the password and a per-account salt.
//!    It never leaves the device.
//!
//! 2. **Keypair**: an RSA keypair generated at registration. The private
//!    half is only ever stored encrypted under the master key.
//!
//! 3. **Diary Key**: a random key per diary, wrapped either under the master
//!    key (owner access) or under a public key (sharing).
//!
//! # Known weakness
//!
//! The symmetric cipher is unauthenticated AES-CTR with a fixed starting
//! counter, matching data already stored by existing clients. Decrypting
//! with the wrong key returns garbage of the same length instead of an
//! error, and tampering is not detected.

mod cipher;
pub mod codec;
mod error;
mod key;
pub mod keypair;

pub use cipher::{decrypt, decrypt_text, encrypt, encrypt_text, unwrap_key, wrap_key};
pub use codec::{bytes_to_text, decode_base64, encode_base64};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_master_key, generate_symmetric_key, KdfParams, Salt, SymmetricKey, KEY_SIZE, SALT_SIZE,
};
pub use keypair::{
    decrypt_asymmetric, encrypt_asymmetric, generate_keypair, open_key, seal_key,
    validate_private_key, RsaKeyPair, DEFAULT_RSA_BITS, MIN_RSA_BITS,
};
