//! Storage for session secrets.
//!
//! The store is the only place secrets persist between calls. It is handed
//! to every component explicitly and lives as long as the session that
//! owns it. Slots are typed, so clearing a session cannot catch unrelated
//! entries the way a string-prefix delete could.

use std::collections::HashMap;
use std::sync::RwLock;
use zeroize::Zeroizing;

/// A named secret slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySlot {
    MasterKey,
    PrivateKey,
    AccessToken,
    DiaryKey(String),
}

/// Key-value store for session secrets.
///
/// Single-slot `get`/`set`/`remove` must be atomic. `clear_session` drops
/// every slot; implementations should make that a single step where they
/// can, so that a partially cleared session is never observable.
pub trait KeyStore: Send + Sync {
    fn get(&self, slot: &KeySlot) -> Option<Zeroizing<Vec<u8>>>;

    fn set(&self, slot: KeySlot, value: Zeroizing<Vec<u8>>);

    fn remove(&self, slot: &KeySlot);

    /// Removes the master key, private key, access token and every diary key.
    fn clear_session(&self);
}

/// In-memory [`KeyStore`]. Values are zeroized when overwritten or cleared.
#[derive(Default)]
pub struct MemoryKeyStore {
    slots: RwLock<HashMap<KeySlot, Zeroizing<Vec<u8>>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<KeySlot, Zeroizing<Vec<u8>>>> {
        self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<KeySlot, Zeroizing<Vec<u8>>>> {
        self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, slot: &KeySlot) -> Option<Zeroizing<Vec<u8>>> {
        self.read().get(slot).cloned()
    }

    fn set(&self, slot: KeySlot, value: Zeroizing<Vec<u8>>) {
        self.write().insert(slot, value);
    }

    fn remove(&self, slot: &KeySlot) {
        self.write().remove(slot);
    }

    fn clear_session(&self) {
        // One write lock: readers see either the full session or nothing.
        self.write().clear();
    }
}
