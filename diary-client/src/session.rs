//! Session secrets: access token, master key and private key.
//!
//! Session validity is decided locally from the token's `exp` claim; no
//! network call is made.

use crate::error::{DiaryError, DiaryResult};
use crate::key_store::{KeySlot, KeyStore};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use diary_crypto::SymmetricKey;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Caches the secrets of one logged-in session in a [`KeyStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    pub fn cache_token(&self, token: &str) {
        self.store
            .set(KeySlot::AccessToken, Zeroizing::new(token.as_bytes().to_vec()));
    }

    /// The cached bearer token; `AuthRequired` if there is none.
    pub fn token(&self) -> DiaryResult<String> {
        let bytes = self.store.get(&KeySlot::AccessToken).ok_or(DiaryError::AuthRequired)?;
        let token = String::from_utf8(bytes.to_vec()).map_err(|_| DiaryError::AuthRequired)?;
        if token.is_empty() {
            return Err(DiaryError::AuthRequired);
        }
        Ok(token)
    }

    pub fn cache_master_key(&self, key: &SymmetricKey) {
        self.store
            .set(KeySlot::MasterKey, Zeroizing::new(key.as_bytes().to_vec()));
    }

    pub fn master_key(&self) -> DiaryResult<SymmetricKey> {
        let bytes = self.store.get(&KeySlot::MasterKey).ok_or(DiaryError::AuthRequired)?;
        Ok(SymmetricKey::from_slice(&bytes)?)
    }

    pub fn cache_private_key(&self, private_pem: &str) {
        self.store.set(
            KeySlot::PrivateKey,
            Zeroizing::new(private_pem.as_bytes().to_vec()),
        );
    }

    pub fn private_key(&self) -> DiaryResult<Zeroizing<String>> {
        let bytes = self.store.get(&KeySlot::PrivateKey).ok_or(DiaryError::AuthRequired)?;
        let pem = String::from_utf8(bytes.to_vec()).map_err(|_| {
            DiaryError::Crypto(diary_crypto::CryptoError::Encoding(
                "cached private key is not utf-8".to_string(),
            ))
        })?;
        Ok(Zeroizing::new(pem))
    }

    /// True if a token is cached and its `exp` claim lies in the future.
    pub fn is_session_valid(&self) -> bool {
        self.is_session_valid_at(Utc::now())
    }

    pub fn is_session_valid_at(&self, now: DateTime<Utc>) -> bool {
        let Ok(token) = self.token() else {
            return false;
        };
        match token_expiry(&token) {
            Some(expires_at) => now < expires_at,
            None => {
                debug!("cached token has no readable exp claim");
                false
            }
        }
    }

    /// Drops every cached secret, diary keys included.
    pub fn clear(&self) {
        self.store.clear_session();
    }
}

/// Reads the `exp` claim (seconds since the epoch) from a JWT without
/// verifying its signature.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    DateTime::from_timestamp(secs, 0)
}
