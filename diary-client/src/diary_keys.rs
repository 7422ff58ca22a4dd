//! Diary id → diary key resolution.
//!
//! The manager is the only in-process authority for turning a diary id into
//! a usable key. Keys arrive either unwrapped from the diary listing
//! (owner access), from registration, or through sharing.

use crate::error::{DiaryError, DiaryResult};
use crate::key_store::{KeySlot, KeyStore};
use crate::types::DiaryRecord;
use diary_crypto::{unwrap_key, SymmetricKey};
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Per-diary key cache on top of a [`KeyStore`].
#[derive(Clone)]
pub struct DiaryKeyManager {
    store: Arc<dyn KeyStore>,
}

impl DiaryKeyManager {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Returns the current key of a diary.
    ///
    /// A miss is a local-state bug and is reported as `DiaryKeyNotFound`,
    /// never papered over with a default key.
    pub fn resolve(&self, diary_id: &str) -> DiaryResult<SymmetricKey> {
        let bytes = self
            .store
            .get(&KeySlot::DiaryKey(diary_id.to_string()))
            .ok_or_else(|| DiaryError::DiaryKeyNotFound(diary_id.to_string()))?;
        Ok(SymmetricKey::from_slice(&bytes)?)
    }

    /// Stores (or rotates) the key of a diary.
    ///
    /// Content already encrypted under a previous key is not touched; the
    /// caller must re-encrypt anything that has to stay readable.
    pub fn cache(&self, diary_id: &str, key: &SymmetricKey) {
        self.store.set(
            KeySlot::DiaryKey(diary_id.to_string()),
            Zeroizing::new(key.as_bytes().to_vec()),
        );
    }

    /// Unwraps every listed diary key under `master_key` without caching.
    ///
    /// Diaries listed without a key are skipped. A key that fails to unwrap
    /// fails the whole listing with the crypto error.
    pub fn unwrap_listed(
        &self,
        diaries: &[DiaryRecord],
        master_key: &SymmetricKey,
    ) -> DiaryResult<Vec<(String, SymmetricKey)>> {
        let mut unwrapped = Vec::with_capacity(diaries.len());
        for diary in diaries {
            let Some(wrapped) = diary.encrypted_diary_key.as_deref() else {
                warn!("diary {} listed without a wrapped key, skipping", diary.id);
                continue;
            };
            unwrapped.push((diary.id.clone(), unwrap_key(master_key, wrapped)?));
        }
        Ok(unwrapped)
    }

    pub fn cache_all(&self, keys: &[(String, SymmetricKey)]) {
        for (diary_id, key) in keys {
            self.cache(diary_id, key);
        }
    }

    /// Unwraps every listed diary key under `master_key` and caches them.
    ///
    /// All-or-nothing: nothing is cached unless every listed key unwraps.
    pub fn ingest(&self, diaries: &[DiaryRecord], master_key: &SymmetricKey) -> DiaryResult<usize> {
        let keys = self.unwrap_listed(diaries, master_key)?;
        self.cache_all(&keys);
        debug!("ingested {} of {} diary keys", keys.len(), diaries.len());
        Ok(keys.len())
    }
}
