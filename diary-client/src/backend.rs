//! Remote collaborators the client core talks to.
//!
//! Every call that needs authorization takes the bearer token explicitly;
//! the token lives in the session's key store, not in the transport. All
//! `value` fields crossing these traits are Base64 ciphertext.

use crate::error::DiaryResult;
use crate::types::*;
use async_trait::async_trait;

/// Account creation and credential checks.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, req: &RegisterRequest) -> DiaryResult<RegisterResponse>;

    /// Wrong credentials are reported through `auth_status`, not as an error.
    async fn login(&self, req: &LoginRequest) -> DiaryResult<LoginResponse>;
}

/// User lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// The caller's own profile, including salt and wrapped private key.
    async fn profile(&self, token: &str) -> DiaryResult<UserProfile>;

    /// Another user's public key (PEM), by id or username.
    async fn public_key(&self, token: &str, user: &str) -> DiaryResult<String>;
}

/// Diary listing.
#[async_trait]
pub trait DiaryApi: Send + Sync {
    /// Every diary the caller can read, each with its key wrapped under the
    /// caller's master key.
    async fn list_diaries(&self, token: &str) -> DiaryResult<Vec<DiaryRecord>>;
}

/// Entry CRUD on ciphertext.
#[async_trait]
pub trait EntryApi: Send + Sync {
    async fn list_entries(&self, token: &str, query: &EntryQuery) -> DiaryResult<Vec<ShortDiaryEntry>>;

    async fn get_entry(&self, token: &str, id: &str) -> DiaryResult<EncryptedDiaryEntry>;

    async fn create_entry(
        &self,
        token: &str,
        req: &CreateDiaryEntryRequest,
    ) -> DiaryResult<EncryptedDiaryEntry>;

    async fn update_entry(
        &self,
        token: &str,
        id: &str,
        req: &UpdateDiaryEntryRequest,
    ) -> DiaryResult<EncryptedDiaryEntry>;

    async fn delete_entry(&self, token: &str, id: &str) -> DiaryResult<()>;
}

/// Sharing tasks.
#[async_trait]
pub trait SharingApi: Send + Sync {
    /// Creates a sharing task; returns the id of the new shared diary.
    async fn share_entry(&self, token: &str, req: &ShareEntryRequest) -> DiaryResult<ShareEntryResponse>;

    /// Tasks addressed to the caller.
    async fn list_sharing_tasks(&self, token: &str) -> DiaryResult<Vec<SharingTaskRecord>>;

    async fn accept_sharing_task(
        &self,
        token: &str,
        diary_id: &str,
        req: &AcceptSharingTaskRequest,
    ) -> DiaryResult<()>;
}

/// Everything the client needs from the server.
pub trait DiaryBackend: AuthApi + UserDirectory + DiaryApi + EntryApi + SharingApi {}

impl<T> DiaryBackend for T where T: AuthApi + UserDirectory + DiaryApi + EntryApi + SharingApi {}
