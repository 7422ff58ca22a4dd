//! High-level client API.
//!
//! `DiaryClient` ties the session, the diary key cache, the entry codec
//! and the sharing protocol to one backend. Callers only see plaintext;
//! every collaborator only sees ciphertext.

use crate::api_client::DiaryApiClient;
use crate::backend::DiaryBackend;
use crate::config::ClientConfig;
use crate::diary_keys::DiaryKeyManager;
use crate::entry_codec::{build_create, build_update, decrypt_entry};
use crate::error::DiaryResult;
use crate::identity::IdentityManager;
use crate::key_store::KeyStore;
use crate::session::SessionManager;
use crate::sharing::ShareManager;
use crate::types::*;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Diary client bound to one key store and one backend.
///
/// Operations touching the same diary must not run concurrently: key
/// rotation updates the cache in place.
pub struct DiaryClient {
    backend: Arc<dyn DiaryBackend>,
    session: SessionManager,
    diary_keys: DiaryKeyManager,
    identity: IdentityManager,
    sharing: ShareManager,
}

impl DiaryClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn KeyStore>,
        backend: Arc<dyn DiaryBackend>,
    ) -> DiaryResult<Self> {
        config.validate()?;
        let session = SessionManager::new(store.clone());
        let diary_keys = DiaryKeyManager::new(store);
        let identity = IdentityManager::new(
            backend.clone(),
            session.clone(),
            diary_keys.clone(),
            config,
        );
        let sharing = ShareManager::new(backend.clone(), session.clone(), diary_keys.clone());
        Ok(Self {
            backend,
            session,
            diary_keys,
            identity,
            sharing,
        })
    }

    /// Builds a client talking HTTP to `config.api_base_url`. Installs the
    /// stderr log subscriber unless the host already set one.
    pub fn connect(config: ClientConfig, store: Arc<dyn KeyStore>) -> DiaryResult<Self> {
        crate::init_tracing();
        let backend = Arc::new(DiaryApiClient::new(config.clone())?);
        Self::new(config, store, backend)
    }

    // ── Session ──

    pub fn is_logged_in(&self) -> bool {
        self.session.is_session_valid()
    }

    pub async fn register(&self, username: &str, password: &str) -> DiaryResult<RegisterOutcome> {
        self.identity.register(username, password).await
    }

    pub async fn login(&self, username: &str, password: &str) -> DiaryResult<AuthResult> {
        self.identity.login(username, password).await
    }

    pub fn logout(&self) {
        self.identity.logout();
    }

    // ── Diaries ──

    /// Lists the caller's diaries and refreshes their keys.
    pub async fn get_diaries(&self) -> DiaryResult<Vec<Diary>> {
        let token = self.session.token()?;
        let master_key = self.session.master_key()?;
        let records = self.backend.list_diaries(&token).await?;
        self.diary_keys.ingest(&records, &master_key)?;
        Ok(records.into_iter().map(Diary::from).collect())
    }

    // ── Entries ──

    /// Entry headers, optionally filtered by diary and day. Nothing is
    /// decrypted.
    pub async fn get_entries(
        &self,
        diary_id: Option<&str>,
        date: Option<NaiveDate>,
    ) -> DiaryResult<Vec<ShortDiaryEntry>> {
        let token = self.session.token()?;
        let query = EntryQuery {
            diary_id: diary_id.map(str::to_string),
            date,
        };
        self.backend.list_entries(&token, &query).await
    }

    pub async fn get_entry(&self, id: &str) -> DiaryResult<DiaryEntry> {
        let token = self.session.token()?;
        let entry = self.backend.get_entry(&token, id).await?;
        let key = self.diary_keys.resolve(&entry.diary_id)?;
        Ok(decrypt_entry(&entry, &key)?)
    }

    pub async fn create_entry(&self, entry: &CreateDiaryEntry) -> DiaryResult<DiaryEntry> {
        let token = self.session.token()?;
        let key = self.diary_keys.resolve(&entry.diary_id)?;
        let req = build_create(entry, &key)?;
        let created = self.backend.create_entry(&token, &req).await?;
        debug!("created entry {} in diary {}", created.id, created.diary_id);
        Ok(decrypt_entry(&created, &key)?)
    }

    /// Applies `update` to entry `id`.
    ///
    /// Moving the entry to another diary re-encrypts every field the
    /// update does not replace, so the whole entry ends up under the
    /// target diary's key.
    pub async fn update_entry(&self, id: &str, update: &UpdateDiaryEntry) -> DiaryResult<DiaryEntry> {
        let token = self.session.token()?;
        let current = self.backend.get_entry(&token, id).await?;

        let old_key = self.diary_keys.resolve(&current.diary_id)?;
        let target = update.diary_id.as_deref().unwrap_or(&current.diary_id);
        let new_key = self.diary_keys.resolve(target)?;

        let req = build_update(&current, update, &old_key, &new_key)?;
        let updated = self.backend.update_entry(&token, id, &req).await?;
        debug!("updated entry {id} in diary {}", updated.diary_id);
        Ok(decrypt_entry(&updated, &new_key)?)
    }

    pub async fn delete_entry(&self, id: &str) -> DiaryResult<()> {
        let token = self.session.token()?;
        self.backend.delete_entry(&token, id).await
    }

    // ── Sharing ──

    /// Shares an entry with another user; returns the new diary's id.
    pub async fn share_entry(&self, entry_id: &str, receiver: &str) -> DiaryResult<String> {
        self.sharing.share(entry_id, receiver).await
    }

    pub async fn get_sharing_tasks(&self) -> DiaryResult<Vec<SharingTask>> {
        self.sharing.pending_tasks().await
    }

    pub async fn accept_sharing_task(&self, diary_id: &str) -> DiaryResult<()> {
        self.sharing.accept(diary_id).await
    }
}
