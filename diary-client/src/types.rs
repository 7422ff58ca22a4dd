//! Shared types: wire DTOs exchanged with the server and the plaintext
//! views handed to callers.
//!
//! Every `value` on an `Encrypted*` type is Base64 ciphertext. Plaintext
//! types are never sent to a collaborator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a register or login call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthStatus {
    Authorized,
    IncorrectUsernameOrPassword,
}

/// Result of [`login`](crate::client::DiaryClient::login).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthResult {
    pub auth_status: AuthStatus,
}

/// Result of [`register`](crate::client::DiaryClient::register).
#[derive(Clone, Debug)]
pub struct RegisterOutcome {
    pub auth_status: AuthStatus,
    /// Id of the initial diary, whose key is already cached.
    pub diary_id: Option<String>,
    /// The account's public key (PEM).
    pub public_key: String,
}

// ── Auth ──

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Base64.
    pub master_key_salt: String,
    /// PEM.
    pub public_key: String,
    /// Private key PEM encrypted under the master key, Base64.
    pub encrypted_private_key: String,
    /// Initial diary key wrapped under the master key, Base64.
    pub encrypted_diary_key: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub auth_status: AuthStatus,
    #[serde(default)]
    pub diary_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub auth_status: AuthStatus,
    #[serde(default)]
    pub token: Option<String>,
}

// ── Users ──

/// The caller's own account record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub master_key_salt: String,
    pub public_key: String,
    pub encrypted_private_key: String,
}

// ── Diaries ──

/// A diary as listed by the server, with its key wrapped under the
/// caller's master key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryRecord {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub encrypted_diary_key: Option<String>,
}

/// A diary as exposed to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diary {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

impl From<DiaryRecord> for Diary {
    fn from(record: DiaryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            owner_id: record.owner_id,
        }
    }
}

// ── Entries ──

/// Entry header without content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortDiaryEntry {
    pub id: String,
    pub diary_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
}

/// Filter for listing entries.
#[derive(Clone, Debug, Default)]
pub struct EntryQuery {
    pub diary_id: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlock {
    pub id: String,
    pub value: String,
}

/// An entry as stored by the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedDiaryEntry {
    pub id: String,
    pub diary_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub value: String,
    #[serde(default)]
    pub blocks: Vec<EncryptedBlock>,
}

impl EncryptedDiaryEntry {
    pub fn summary(&self) -> ShortDiaryEntry {
        ShortDiaryEntry {
            id: self.id.clone(),
            diary_id: self.diary_id.clone(),
            name: self.name.clone(),
            date: self.date,
        }
    }
}

/// Decrypted block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiaryEntryBlock {
    pub id: String,
    pub value: String,
}

/// Decrypted entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiaryEntry {
    pub id: String,
    pub diary_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub value: String,
    pub blocks: Vec<DiaryEntryBlock>,
}

/// Plaintext block write. `id: None` creates a new block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockUpsert {
    pub id: Option<String>,
    pub value: String,
}

impl BlockUpsert {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: None,
            value: value.into(),
        }
    }

    pub fn existing(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlockUpsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: String,
}

/// Plaintext entry creation.
#[derive(Clone, Debug)]
pub struct CreateDiaryEntry {
    pub diary_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub value: String,
    pub blocks: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiaryEntryRequest {
    pub diary_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub value: String,
    pub blocks: Vec<EncryptedBlockUpsert>,
}

/// Plaintext entry update. `diary_id: Some(other)` moves the entry into
/// another diary; all of its content is migrated to that diary's key.
#[derive(Clone, Debug, Default)]
pub struct UpdateDiaryEntry {
    pub diary_id: Option<String>,
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub value: Option<String>,
    pub blocks_to_upsert: Vec<BlockUpsert>,
    pub blocks_to_delete: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiaryEntryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diary_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub blocks_to_upsert: Vec<EncryptedBlockUpsert>,
    #[serde(default)]
    pub blocks_to_delete: Vec<String>,
}

// ── Sharing ──

/// Sharing task lifecycle. `Pending` is the only non-terminal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharingStatus {
    Created,
    #[default]
    Pending,
    Accepted,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntryRequest {
    pub diary_entry_id: String,
    pub receiver_user_id: String,
    /// New diary key wrapped under the sender's master key.
    pub sender_encrypted_diary_key: String,
    /// New diary key wrapped under the receiver's public key.
    pub receiver_encrypted_diary_key: String,
    /// Entry value re-encrypted under the new diary key.
    pub value: String,
    pub blocks: Vec<EncryptedBlock>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntryResponse {
    pub diary_id: String,
}

/// A sharing task as returned by the server to its receiver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingTaskRecord {
    pub diary_id: String,
    /// Sender.
    pub username: String,
    pub shared_at: DateTime<Utc>,
    /// Diary key wrapped under the receiver's public key, Base64.
    pub encrypted_diary_key: String,
    #[serde(default)]
    pub status: SharingStatus,
}

/// A sharing task as exposed to callers (no key material).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharingTask {
    pub diary_id: String,
    pub username: String,
    pub shared_at: DateTime<Utc>,
    pub status: SharingStatus,
}

impl From<&SharingTaskRecord> for SharingTask {
    fn from(record: &SharingTaskRecord) -> Self {
        Self {
            diary_id: record.diary_id.clone(),
            username: record.username.clone(),
            shared_at: record.shared_at,
            status: record.status,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptSharingTaskRequest {
    /// Diary key re-wrapped under the receiver's master key, Base64.
    pub encrypted_diary_key: String,
}
