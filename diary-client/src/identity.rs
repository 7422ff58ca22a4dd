//! Account registration and login.
//!
//! Both flows end with the session populated: token, master key and
//! private key in the session slots, diary keys in the diary key cache.
//! The password itself is never cached.

use crate::backend::DiaryBackend;
use crate::config::ClientConfig;
use crate::diary_keys::DiaryKeyManager;
use crate::error::{DiaryError, DiaryResult};
use crate::session::SessionManager;
use crate::types::{
    AuthResult, AuthStatus, LoginRequest, RegisterOutcome, RegisterRequest,
};
use diary_crypto::{
    decode_base64, decrypt_text, derive_master_key, encode_base64, encrypt_text,
    generate_keypair, generate_symmetric_key, validate_private_key, wrap_key, Salt,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the register and login flows against the auth collaborators.
#[derive(Clone)]
pub struct IdentityManager {
    backend: Arc<dyn DiaryBackend>,
    session: SessionManager,
    diary_keys: DiaryKeyManager,
    config: ClientConfig,
}

impl IdentityManager {
    pub fn new(
        backend: Arc<dyn DiaryBackend>,
        session: SessionManager,
        diary_keys: DiaryKeyManager,
        config: ClientConfig,
    ) -> Self {
        Self {
            backend,
            session,
            diary_keys,
            config,
        }
    }

    /// Creates an account with a fresh key hierarchy.
    ///
    /// Only wrapped key material leaves the process. On `Authorized` the
    /// session is populated and the initial diary key is cached under the
    /// diary id the server assigned. `Authorized` without a token is
    /// `AuthRequired` and caches nothing, same as login.
    pub async fn register(&self, username: &str, password: &str) -> DiaryResult<RegisterOutcome> {
        self.session.clear();

        let salt = Salt::random();
        let master_key = derive_master_key(password, &salt, &self.config.kdf)?;
        let keypair = generate_keypair(self.config.rsa_key_bits)?;
        let diary_key = generate_symmetric_key();

        let req = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            master_key_salt: encode_base64(salt.as_bytes()),
            public_key: keypair.public_key.clone(),
            encrypted_private_key: encrypt_text(&master_key, &keypair.private_key)?,
            encrypted_diary_key: wrap_key(&master_key, &diary_key)?,
        };

        let resp = self.backend.register(&req).await?;
        if resp.auth_status != AuthStatus::Authorized {
            info!("registration of {username} was rejected");
            return Ok(RegisterOutcome {
                auth_status: resp.auth_status,
                diary_id: None,
                public_key: keypair.public_key,
            });
        }

        let token = resp
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(DiaryError::AuthRequired)?;

        self.session.cache_token(token);
        self.session.cache_master_key(&master_key);
        self.session.cache_private_key(&keypair.private_key);
        match resp.diary_id.as_deref() {
            Some(diary_id) => self.diary_keys.cache(diary_id, &diary_key),
            None => warn!("registration returned no initial diary id"),
        }

        info!("registered {username}");
        Ok(RegisterOutcome {
            auth_status: AuthStatus::Authorized,
            diary_id: resp.diary_id,
            public_key: keypair.public_key,
        })
    }

    /// Authenticates and rebuilds the key hierarchy from the stored profile.
    ///
    /// Every cached key is dropped first and nothing is cached until every
    /// listed diary key has unwrapped, so a failed or rejected login leaves
    /// an empty session.
    pub async fn login(&self, username: &str, password: &str) -> DiaryResult<AuthResult> {
        self.session.clear();

        let resp = self
            .backend
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;

        if resp.auth_status != AuthStatus::Authorized {
            info!("login rejected for {username}");
            return Ok(AuthResult {
                auth_status: resp.auth_status,
            });
        }
        let token = resp
            .token
            .filter(|t| !t.is_empty())
            .ok_or(DiaryError::AuthRequired)?;

        let profile = self.backend.profile(&token).await?;
        let salt = Salt::from_slice(&decode_base64(&profile.master_key_salt)?)?;
        let master_key = derive_master_key(password, &salt, &self.config.kdf)?;

        // A wrong master key surfaces here as non-UTF-8 or unparsable PEM.
        let private_pem = zeroize::Zeroizing::new(decrypt_text(
            &master_key,
            &profile.encrypted_private_key,
        )?);
        validate_private_key(&private_pem)?;

        let diaries = self.backend.list_diaries(&token).await?;
        let diary_keys = self.diary_keys.unwrap_listed(&diaries, &master_key)?;

        self.session.cache_token(&token);
        self.session.cache_master_key(&master_key);
        self.session.cache_private_key(&private_pem);
        self.diary_keys.cache_all(&diary_keys);
        debug!("login restored {} diary keys", diary_keys.len());

        info!("logged in as {username}");
        Ok(AuthResult {
            auth_status: AuthStatus::Authorized,
        })
    }

    pub fn logout(&self) {
        self.session.clear();
        info!("session cleared");
    }
}
