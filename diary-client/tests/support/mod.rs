//! In-memory diary server for protocol tests.
//!
//! Stores exactly what a real server would: wrapped keys per (user, diary),
//! ciphertext entries and sharing tasks. It never sees a plaintext key.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use diary_client::backend::{AuthApi, DiaryApi, EntryApi, SharingApi, UserDirectory};
use diary_client::{
    AcceptSharingTaskRequest, AuthStatus, ClientConfig, CreateDiaryEntryRequest, DiaryClient,
    DiaryError, DiaryRecord, DiaryResult, EncryptedBlock, EncryptedDiaryEntry, EntryQuery,
    LoginRequest, LoginResponse, MemoryKeyStore, RegisterRequest, RegisterResponse,
    ShareEntryRequest, ShareEntryResponse, SharingStatus, SharingTaskRecord, ShortDiaryEntry,
    UpdateDiaryEntryRequest, UserProfile,
};
use diary_crypto::MIN_RSA_BITS;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
struct User {
    id: String,
    username: String,
    password: String,
    master_key_salt: String,
    public_key: String,
    encrypted_private_key: String,
}

#[derive(Clone)]
struct StoredDiary {
    id: String,
    name: String,
    owner_id: String,
}

#[derive(Clone)]
struct StoredTask {
    diary_id: String,
    sender: String,
    receiver_id: String,
    shared_at: chrono::DateTime<Utc>,
    encrypted_diary_key: String,
    status: SharingStatus,
}

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    diaries: HashMap<String, StoredDiary>,
    /// (user id, diary id) -> diary key wrapped under that user's master key.
    access: HashMap<(String, String), String>,
    entries: HashMap<String, EncryptedDiaryEntry>,
    tasks: Vec<StoredTask>,
}

impl State {
    fn user_by_token(&self, token: &str) -> DiaryResult<User> {
        let id = self.tokens.get(token).ok_or_else(|| remote(401, "invalid token"))?;
        self.user_by_id(id)
    }

    fn user_by_id(&self, id: &str) -> DiaryResult<User> {
        self.users
            .values()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| remote(404, "user not found"))
    }

    fn user_by_ref(&self, user: &str) -> DiaryResult<User> {
        self.users
            .get(user)
            .cloned()
            .or_else(|| self.user_by_id(user).ok())
            .ok_or_else(|| remote(404, "user not found"))
    }

    fn can_read(&self, user_id: &str, diary_id: &str) -> bool {
        self.access
            .contains_key(&(user_id.to_string(), diary_id.to_string()))
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = fake_jwt(user_id, Utc::now() + Duration::hours(1));
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }
}

fn remote(status: u16, body: &str) -> DiaryError {
    DiaryError::RemoteCall {
        status,
        body: body.to_string(),
    }
}

/// Unsigned JWT carrying `sub` and `exp`.
pub fn fake_jwt(sub: &str, exp: chrono::DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "sub": sub,
        "exp": exp.timestamp(),
        "jti": Uuid::new_v4().to_string(),
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

/// Shared fake server. Clone the `Arc` into as many clients as needed.
#[derive(Default)]
pub struct FakeServer {
    state: Mutex<State>,
    fail_share: AtomicBool,
    fail_accept: AtomicBool,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next share calls fail with a 500 until reset.
    pub fn fail_shares(&self, fail: bool) {
        self.fail_share.store(fail, Ordering::SeqCst);
    }

    pub fn fail_accepts(&self, fail: bool) {
        self.fail_accept.store(fail, Ordering::SeqCst);
    }

    /// Raw stored ciphertext of an entry.
    pub fn stored_entry(&self, id: &str) -> Option<EncryptedDiaryEntry> {
        self.lock().entries.get(id).cloned()
    }

    pub fn diary_count(&self) -> usize {
        self.lock().diaries.len()
    }

    /// Creates an extra diary owned by `username` with a pre-wrapped key.
    pub fn add_diary(&self, username: &str, name: &str, wrapped_key: &str) -> String {
        let mut state = self.lock();
        let owner_id = state.users[username].id.clone();
        let id = Uuid::new_v4().to_string();
        state.diaries.insert(
            id.clone(),
            StoredDiary {
                id: id.clone(),
                name: name.to_string(),
                owner_id: owner_id.clone(),
            },
        );
        state
            .access
            .insert((owner_id, id.clone()), wrapped_key.to_string());
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl AuthApi for FakeServer {
    async fn register(&self, req: &RegisterRequest) -> DiaryResult<RegisterResponse> {
        let mut state = self.lock();
        if state.users.contains_key(&req.username) {
            return Err(remote(409, "username taken"));
        }
        let user_id = Uuid::new_v4().to_string();
        state.users.insert(
            req.username.clone(),
            User {
                id: user_id.clone(),
                username: req.username.clone(),
                password: req.password.clone(),
                master_key_salt: req.master_key_salt.clone(),
                public_key: req.public_key.clone(),
                encrypted_private_key: req.encrypted_private_key.clone(),
            },
        );

        let diary_id = Uuid::new_v4().to_string();
        state.diaries.insert(
            diary_id.clone(),
            StoredDiary {
                id: diary_id.clone(),
                name: format!("{}'s diary", req.username),
                owner_id: user_id.clone(),
            },
        );
        state.access.insert(
            (user_id.clone(), diary_id.clone()),
            req.encrypted_diary_key.clone(),
        );

        let token = state.issue_token(&user_id);
        Ok(RegisterResponse {
            auth_status: AuthStatus::Authorized,
            diary_id: Some(diary_id),
            token: Some(token),
        })
    }

    async fn login(&self, req: &LoginRequest) -> DiaryResult<LoginResponse> {
        let mut state = self.lock();
        let user = match state.users.get(&req.username) {
            Some(user) if user.password == req.password => user.clone(),
            _ => {
                return Ok(LoginResponse {
                    auth_status: AuthStatus::IncorrectUsernameOrPassword,
                    token: None,
                });
            }
        };
        let token = state.issue_token(&user.id);
        Ok(LoginResponse {
            auth_status: AuthStatus::Authorized,
            token: Some(token),
        })
    }
}

#[async_trait]
impl UserDirectory for FakeServer {
    async fn profile(&self, token: &str) -> DiaryResult<UserProfile> {
        let user = self.lock().user_by_token(token)?;
        Ok(UserProfile {
            id: user.id,
            username: user.username,
            master_key_salt: user.master_key_salt,
            public_key: user.public_key,
            encrypted_private_key: user.encrypted_private_key,
        })
    }

    async fn public_key(&self, token: &str, user: &str) -> DiaryResult<String> {
        let state = self.lock();
        state.user_by_token(token)?;
        Ok(state.user_by_ref(user)?.public_key)
    }
}

#[async_trait]
impl DiaryApi for FakeServer {
    async fn list_diaries(&self, token: &str) -> DiaryResult<Vec<DiaryRecord>> {
        let state = self.lock();
        let user = state.user_by_token(token)?;
        let mut diaries: Vec<DiaryRecord> = state
            .access
            .iter()
            .filter(|((user_id, _), _)| *user_id == user.id)
            .filter_map(|((_, diary_id), wrapped)| {
                state.diaries.get(diary_id).map(|d| DiaryRecord {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    owner_id: d.owner_id.clone(),
                    encrypted_diary_key: Some(wrapped.clone()),
                })
            })
            .collect();
        diaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(diaries)
    }
}

#[async_trait]
impl EntryApi for FakeServer {
    async fn list_entries(&self, token: &str, query: &EntryQuery) -> DiaryResult<Vec<ShortDiaryEntry>> {
        let state = self.lock();
        let user = state.user_by_token(token)?;
        let mut entries: Vec<ShortDiaryEntry> = state
            .entries
            .values()
            .filter(|e| state.can_read(&user.id, &e.diary_id))
            .filter(|e| query.diary_id.as_deref().is_none_or(|d| d == e.diary_id))
            .filter(|e| query.date.is_none_or(|d| d == e.date.date_naive()))
            .map(EncryptedDiaryEntry::summary)
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(entries)
    }

    async fn get_entry(&self, token: &str, id: &str) -> DiaryResult<EncryptedDiaryEntry> {
        let state = self.lock();
        let user = state.user_by_token(token)?;
        let entry = state
            .entries
            .get(id)
            .ok_or_else(|| remote(404, "entry not found"))?;
        if !state.can_read(&user.id, &entry.diary_id) {
            return Err(remote(403, "no access to diary"));
        }
        Ok(entry.clone())
    }

    async fn create_entry(
        &self,
        token: &str,
        req: &CreateDiaryEntryRequest,
    ) -> DiaryResult<EncryptedDiaryEntry> {
        let mut state = self.lock();
        let user = state.user_by_token(token)?;
        if !state.can_read(&user.id, &req.diary_id) {
            return Err(remote(403, "no access to diary"));
        }
        let entry = EncryptedDiaryEntry {
            id: Uuid::new_v4().to_string(),
            diary_id: req.diary_id.clone(),
            name: req.name.clone(),
            date: req.date,
            value: req.value.clone(),
            blocks: req
                .blocks
                .iter()
                .map(|b| EncryptedBlock {
                    id: b.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                    value: b.value.clone(),
                })
                .collect(),
        };
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn update_entry(
        &self,
        token: &str,
        id: &str,
        req: &UpdateDiaryEntryRequest,
    ) -> DiaryResult<EncryptedDiaryEntry> {
        let mut state = self.lock();
        let user = state.user_by_token(token)?;
        let mut entry = state
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| remote(404, "entry not found"))?;
        if !state.can_read(&user.id, &entry.diary_id) {
            return Err(remote(403, "no access to diary"));
        }
        if let Some(diary_id) = &req.diary_id {
            if !state.can_read(&user.id, diary_id) {
                return Err(remote(403, "no access to target diary"));
            }
            entry.diary_id = diary_id.clone();
        }
        if let Some(name) = &req.name {
            entry.name = name.clone();
        }
        if let Some(date) = req.date {
            entry.date = date;
        }
        if let Some(value) = &req.value {
            entry.value = value.clone();
        }
        entry.blocks.retain(|b| !req.blocks_to_delete.contains(&b.id));
        for upsert in &req.blocks_to_upsert {
            match upsert
                .id
                .as_ref()
                .and_then(|id| entry.blocks.iter_mut().find(|b| &b.id == id))
            {
                Some(existing) => existing.value = upsert.value.clone(),
                None => entry.blocks.push(EncryptedBlock {
                    id: upsert.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                    value: upsert.value.clone(),
                }),
            }
        }
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn delete_entry(&self, token: &str, id: &str) -> DiaryResult<()> {
        let mut state = self.lock();
        let user = state.user_by_token(token)?;
        let diary_id = state
            .entries
            .get(id)
            .map(|e| e.diary_id.clone())
            .ok_or_else(|| remote(404, "entry not found"))?;
        if !state.can_read(&user.id, &diary_id) {
            return Err(remote(403, "no access to diary"));
        }
        state.entries.remove(id);
        Ok(())
    }
}

#[async_trait]
impl SharingApi for FakeServer {
    async fn share_entry(&self, token: &str, req: &ShareEntryRequest) -> DiaryResult<ShareEntryResponse> {
        if self.fail_share.load(Ordering::SeqCst) {
            return Err(remote(500, "share failed"));
        }
        let mut state = self.lock();
        let sender = state.user_by_token(token)?;
        let receiver = state.user_by_ref(&req.receiver_user_id)?;
        let source_diary = state
            .entries
            .get(&req.diary_entry_id)
            .map(|e| e.diary_id.clone())
            .ok_or_else(|| remote(404, "entry not found"))?;
        if !state.can_read(&sender.id, &source_diary) {
            return Err(remote(403, "no access to diary"));
        }

        let diary_id = Uuid::new_v4().to_string();
        state.diaries.insert(
            diary_id.clone(),
            StoredDiary {
                id: diary_id.clone(),
                name: format!("shared with {}", receiver.username),
                owner_id: sender.id.clone(),
            },
        );
        state.access.insert(
            (sender.id.clone(), diary_id.clone()),
            req.sender_encrypted_diary_key.clone(),
        );

        // The entry keeps its id and moves into the shared diary.
        if let Some(moved) = state.entries.get_mut(&req.diary_entry_id) {
            moved.diary_id = diary_id.clone();
            moved.value = req.value.clone();
            moved.blocks = req.blocks.clone();
        }

        state.tasks.push(StoredTask {
            diary_id: diary_id.clone(),
            sender: sender.username,
            receiver_id: receiver.id,
            shared_at: Utc::now(),
            encrypted_diary_key: req.receiver_encrypted_diary_key.clone(),
            status: SharingStatus::Pending,
        });

        Ok(ShareEntryResponse { diary_id })
    }

    async fn list_sharing_tasks(&self, token: &str) -> DiaryResult<Vec<SharingTaskRecord>> {
        let state = self.lock();
        let user = state.user_by_token(token)?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.receiver_id == user.id)
            .map(|t| SharingTaskRecord {
                diary_id: t.diary_id.clone(),
                username: t.sender.clone(),
                shared_at: t.shared_at,
                encrypted_diary_key: t.encrypted_diary_key.clone(),
                status: t.status,
            })
            .collect())
    }

    async fn accept_sharing_task(
        &self,
        token: &str,
        diary_id: &str,
        req: &AcceptSharingTaskRequest,
    ) -> DiaryResult<()> {
        if self.fail_accept.load(Ordering::SeqCst) {
            return Err(remote(500, "accept failed"));
        }
        let mut state = self.lock();
        let user = state.user_by_token(token)?;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.receiver_id == user.id && t.diary_id == diary_id)
            .ok_or_else(|| remote(404, "sharing task not found"))?;
        task.status = SharingStatus::Accepted;
        state.access.insert(
            (user.id, diary_id.to_string()),
            req.encrypted_diary_key.clone(),
        );
        Ok(())
    }
}

/// Config with the smallest RSA size the client accepts, so registration
/// stays fast.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        rsa_key_bits: MIN_RSA_BITS,
        ..ClientConfig::default()
    }
}

/// A client with its own key store, sharing `server` with other clients.
pub fn client_for(server: &Arc<FakeServer>) -> (DiaryClient, Arc<MemoryKeyStore>) {
    let store = Arc::new(MemoryKeyStore::new());
    let client = DiaryClient::new(test_config(), store.clone(), server.clone()).unwrap();
    (client, store)
}
