//! Entry sharing between users.
//!
//! Sharing never hands the sender's existing diary key to anyone. The
//! entry is migrated into a new diary with a fresh key, and that key is
//! wrapped twice: under the sender's master key and under the receiver's
//! public key. The receiver later re-wraps it under their own master key
//! when accepting the task.

use crate::backend::DiaryBackend;
use crate::diary_keys::DiaryKeyManager;
use crate::entry_codec::{rekey, TouchedFields};
use crate::error::{DiaryError, DiaryResult};
use crate::session::SessionManager;
use crate::types::{
    AcceptSharingTaskRequest, ShareEntryRequest, SharingStatus, SharingTask, SharingTaskRecord,
};
use diary_crypto::{generate_symmetric_key, open_key, seal_key, wrap_key};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs the sender and receiver halves of the sharing protocol.
#[derive(Clone)]
pub struct ShareManager {
    backend: Arc<dyn DiaryBackend>,
    session: SessionManager,
    diary_keys: DiaryKeyManager,
}

impl ShareManager {
    pub fn new(
        backend: Arc<dyn DiaryBackend>,
        session: SessionManager,
        diary_keys: DiaryKeyManager,
    ) -> Self {
        Self {
            backend,
            session,
            diary_keys,
        }
    }

    /// Shares one entry with `receiver` (user id or username) and returns
    /// the id of the diary created for it.
    ///
    /// The new key is cached only once the server has accepted the share,
    /// so a failed call leaves no orphan key behind. Retrying mints a
    /// second key.
    pub async fn share(&self, entry_id: &str, receiver: &str) -> DiaryResult<String> {
        let token = self.session.token()?;
        let master_key = self.session.master_key()?;

        let receiver_public_key = self.backend.public_key(&token, receiver).await?;
        let entry = self.backend.get_entry(&token, entry_id).await?;
        let old_key = self.diary_keys.resolve(&entry.diary_id)?;

        let new_key = generate_symmetric_key();
        let migrated = rekey(&entry, &old_key, &new_key, &TouchedFields::none())?;

        let req = ShareEntryRequest {
            diary_entry_id: entry.id.clone(),
            receiver_user_id: receiver.to_string(),
            sender_encrypted_diary_key: wrap_key(&master_key, &new_key)?,
            receiver_encrypted_diary_key: seal_key(&new_key, &receiver_public_key)?,
            value: migrated.value.unwrap_or_default(),
            blocks: migrated.blocks,
        };

        let resp = self.backend.share_entry(&token, &req).await?;
        self.diary_keys.cache(&resp.diary_id, &new_key);

        info!("shared entry {entry_id} into diary {}", resp.diary_id);
        Ok(resp.diary_id)
    }

    /// Accepts the sharing task for `diary_id`.
    ///
    /// A task the server already reports as accepted is accepted again
    /// without deduplication; the key and its wrap come out the same.
    pub async fn accept(&self, diary_id: &str) -> DiaryResult<()> {
        let token = self.session.token()?;
        let task = self.find_task(&token, diary_id).await?;

        let private_key = self.session.private_key()?;
        let master_key = self.session.master_key()?;
        let diary_key = open_key(&task.encrypted_diary_key, &private_key)?;

        let req = AcceptSharingTaskRequest {
            encrypted_diary_key: wrap_key(&master_key, &diary_key)?,
        };
        self.backend
            .accept_sharing_task(&token, diary_id, &req)
            .await?;
        self.diary_keys.cache(diary_id, &diary_key);

        info!("accepted sharing task for diary {diary_id}");
        Ok(())
    }

    /// Pending tasks addressed to the caller, without key material.
    pub async fn pending_tasks(&self) -> DiaryResult<Vec<SharingTask>> {
        let token = self.session.token()?;
        let tasks = self.backend.list_sharing_tasks(&token).await?;
        Ok(tasks
            .iter()
            .filter(|t| t.status == SharingStatus::Pending)
            .map(SharingTask::from)
            .collect())
    }

    /// Pending or accepted task for `diary_id`. A task still in `Created`
    /// has no receiver wrap yet and does not count.
    async fn find_task(&self, token: &str, diary_id: &str) -> DiaryResult<SharingTaskRecord> {
        let tasks = self.backend.list_sharing_tasks(token).await?;
        debug!("{} sharing tasks listed", tasks.len());
        tasks
            .into_iter()
            .find(|t| t.diary_id == diary_id && t.status != SharingStatus::Created)
            .ok_or_else(|| DiaryError::SharingTaskNotFound(diary_id.to_string()))
    }
}
